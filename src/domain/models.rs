use chrono::{DateTime, Utc};

use crate::domain::alert::AlertLabel;

/// Validated telemetry as accepted at the ingestion boundary, before the
/// server assigns a timestamp and an alert label.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingInput {
    pub temperature: f64,
    pub humidity: f64,
    pub rain_value: i64,
    pub rain_status: String,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<String>,
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReadingRecord {
    pub temperature: f64,
    pub humidity: f64,
    pub rain_value: Option<i64>,
    pub rain_status: String,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<String>,
    pub visibility: Option<f64>,
    pub alert: AlertLabel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRecord {
    pub id: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub rain_value: Option<i64>,
    pub rain_status: String,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<String>,
    pub visibility: Option<f64>,
    pub alert: String,
    pub created_at: DateTime<Utc>,
}

impl NewReadingRecord {
    pub fn from_input(input: ReadingInput, alert: AlertLabel, created_at: DateTime<Utc>) -> Self {
        Self {
            temperature: input.temperature,
            humidity: input.humidity,
            rain_value: Some(input.rain_value),
            rain_status: input.rain_status,
            wind_speed: input.wind_speed,
            wind_direction: input.wind_direction,
            visibility: input.visibility,
            alert,
            created_at,
        }
    }
}

/// Rounds half away from zero to two decimal places. Magnitudes too large to
/// scale have no fractional digits and come back unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// Incremental arithmetic mean that stays finite for any run of finite inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMean {
    mean: f64,
    count: u32,
}

impl RunningMean {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        self.mean += value / count - self.mean / count;
    }

    /// Mean rounded with [`round2`], `None` before the first sample.
    pub fn average(self) -> Option<f64> {
        (self.count > 0).then(|| round2(self.mean))
    }
}

impl FromIterator<f64> for RunningMean {
    fn from_iter<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut mean = Self::default();
        for value in values {
            mean.add(value);
        }
        mean
    }
}
