use serde::Serialize;

pub const TREND_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

/// Compares the mean of the two newest samples against the mean of the two
/// oldest in a five-sample window; the middle sample is ignored. Anything
/// beyond the first five entries is ignored too.
pub fn estimate_trend(temperatures_newest_first: &[f64]) -> Trend {
    let [t0, t1, _, t3, t4, ..] = temperatures_newest_first else {
        return Trend::Stable;
    };

    let last_avg = (t0 + t1) / 2.0;
    let first_avg = (t3 + t4) / 2.0;

    if last_avg > first_avg {
        Trend::Rising
    } else if last_avg < first_avg {
        Trend::Falling
    } else {
        Trend::Stable
    }
}
