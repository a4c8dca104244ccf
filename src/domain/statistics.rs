use crate::domain::models::RunningMean;

pub const STATS_WINDOW: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollingStats {
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub avg_temp: Option<f64>,
}

pub fn rolling_stats(temperatures_newest_first: &[f64]) -> RollingStats {
    let window = &temperatures_newest_first[..temperatures_newest_first.len().min(STATS_WINDOW)];
    if window.is_empty() {
        return RollingStats::default();
    }

    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean: RunningMean = window.iter().copied().collect();

    RollingStats {
        min_temp: Some(min),
        max_temp: Some(max),
        avg_temp: mean.average(),
    }
}
