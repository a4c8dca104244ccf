use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, DurationRound, NaiveTime, TimeDelta, Utc};
use thiserror::Error;

use crate::domain::models::RunningMean;

pub const HOURLY_BUCKETS: i64 = 12;
pub const DAILY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    #[default]
    Hourly,
    Daily,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown history mode {0:?}; expected \"hourly\" or \"daily\"")]
pub struct UnknownHistoryMode(pub String);

impl FromStr for HistoryMode {
    type Err = UnknownHistoryMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            _ => Err(UnknownHistoryMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSample {
    pub at: DateTime<Utc>,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBucket {
    pub bucket_start: DateTime<Utc>,
    pub avg_temperature: Option<f64>,
}

impl HistoryMode {
    /// Earliest instant a reading must have to land in any bucket of this mode.
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Hourly => floor_hour(now) - TimeDelta::hours(HOURLY_BUCKETS - 1),
            Self::Daily => now - TimeDelta::days(DAILY_WINDOW_DAYS),
        }
    }

    pub fn bucketize(self, samples: &[TemperatureSample], now: DateTime<Utc>) -> Vec<TimeBucket> {
        match self {
            Self::Hourly => hourly_buckets(samples, now),
            Self::Daily => daily_buckets(samples, now),
        }
    }
}

pub fn floor_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::hours(1)).unwrap_or(at)
}

/// Twelve left-aligned hourly buckets ending with the current hour. Every
/// bucket is present; hours without samples carry a `None` average.
pub fn hourly_buckets(samples: &[TemperatureSample], now: DateTime<Utc>) -> Vec<TimeBucket> {
    let first_start = HistoryMode::Hourly.window_start(now);
    let mut means = [RunningMean::default(); HOURLY_BUCKETS as usize];

    for sample in samples {
        if sample.at < first_start || sample.at > now {
            continue;
        }

        let index = sample.at.signed_duration_since(first_start).num_hours();
        if let Some(mean) = usize::try_from(index)
            .ok()
            .and_then(|index| means.get_mut(index))
        {
            mean.add(sample.temperature);
        }
    }

    means
        .iter()
        .zip(0..)
        .map(|(mean, offset)| TimeBucket {
            bucket_start: first_start + TimeDelta::hours(offset),
            avg_temperature: mean.average(),
        })
        .collect()
}

/// One bucket per UTC calendar day inside the trailing seven days. Days
/// without samples are omitted, unlike the hourly series.
pub fn daily_buckets(samples: &[TemperatureSample], now: DateTime<Utc>) -> Vec<TimeBucket> {
    let window_start = HistoryMode::Daily.window_start(now);
    let mut days: BTreeMap<_, RunningMean> = BTreeMap::new();

    for sample in samples {
        if sample.at < window_start || sample.at > now {
            continue;
        }

        days.entry(sample.at.date_naive())
            .or_default()
            .add(sample.temperature);
    }

    days.into_iter()
        .map(|(day, mean)| TimeBucket {
            bucket_start: day.and_time(NaiveTime::MIN).and_utc(),
            avg_temperature: mean.average(),
        })
        .collect()
}
