use chrono::{DateTime, Utc};

use crate::domain::liveness::{DeviceStatus, Liveness, liveness};
use crate::domain::models::ReadingRecord;
use crate::domain::statistics::{RollingStats, rolling_stats};
use crate::domain::trend::{TREND_WINDOW, Trend, estimate_trend};

#[derive(Debug, Clone, PartialEq)]
pub enum LatestSnapshot {
    NoData,
    Offline {
        last_seen: DateTime<Utc>,
    },
    Online {
        reading: ReadingRecord,
        trend: Trend,
        stats: RollingStats,
    },
}

impl LatestSnapshot {
    pub fn device_status(&self) -> DeviceStatus {
        match self {
            Self::NoData => DeviceStatus::NoData,
            Self::Offline { .. } => DeviceStatus::Offline,
            Self::Online { .. } => DeviceStatus::Online,
        }
    }
}

/// Builds the latest view from the newest readings (newest first). Liveness is
/// decided before anything else so stale readings never reach the trend or
/// the statistics.
pub fn latest_snapshot(
    recent_newest_first: &[ReadingRecord],
    now: DateTime<Utc>,
) -> LatestSnapshot {
    let Some(newest) = recent_newest_first.first() else {
        return LatestSnapshot::NoData;
    };

    if liveness(newest.created_at, now) == Liveness::Offline {
        return LatestSnapshot::Offline {
            last_seen: newest.created_at,
        };
    }

    let temperatures: Vec<f64> = recent_newest_first
        .iter()
        .map(|reading| reading.temperature)
        .collect();

    LatestSnapshot::Online {
        reading: newest.clone(),
        trend: estimate_trend(&temperatures[..temperatures.len().min(TREND_WINDOW)]),
        stats: rolling_stats(&temperatures),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};

    use crate::domain::liveness::DeviceStatus;
    use crate::domain::models::ReadingRecord;
    use crate::domain::trend::Trend;
    use crate::test_support::at;

    use super::{LatestSnapshot, latest_snapshot};

    fn record(id: i64, temperature: f64, created_at: DateTime<Utc>) -> ReadingRecord {
        ReadingRecord {
            id,
            temperature,
            humidity: 50.0,
            rain_value: Some(4095),
            rain_status: "No Rain".to_string(),
            wind_speed: Some(5.0),
            wind_direction: Some("N".to_string()),
            visibility: Some(90.0),
            alert: "Normal".to_string(),
            created_at,
        }
    }

    #[test]
    fn empty_history_is_no_data() {
        let snapshot = latest_snapshot(&[], at("2026-03-01T12:00:00Z"));
        assert_eq!(snapshot, LatestSnapshot::NoData);
        assert_eq!(snapshot.device_status(), DeviceStatus::NoData);
    }

    #[test]
    fn stale_reading_suppresses_everything() {
        let last = at("2026-03-01T12:00:00Z");
        let snapshot = latest_snapshot(&[record(1, 20.0, last)], last + TimeDelta::seconds(31));
        assert_eq!(snapshot, LatestSnapshot::Offline { last_seen: last });
    }

    #[test]
    fn fresh_reading_carries_trend_and_stats() {
        let newest = at("2026-03-01T12:00:00Z");
        let recent: Vec<ReadingRecord> = [20.0, 20.0, 18.0, 15.0, 15.0, 10.0]
            .into_iter()
            .enumerate()
            .map(|(offset, temperature)| {
                record(
                    10 - offset as i64,
                    temperature,
                    newest - TimeDelta::seconds(5 * offset as i64),
                )
            })
            .collect();

        let snapshot = latest_snapshot(&recent, newest + TimeDelta::seconds(2));

        let LatestSnapshot::Online {
            reading,
            trend,
            stats,
        } = snapshot
        else {
            panic!("expected online snapshot");
        };
        assert_eq!(reading.id, 10);
        assert_eq!(trend, Trend::Rising);
        assert_eq!(stats.min_temp, Some(10.0));
        assert_eq!(stats.max_temp, Some(20.0));
        assert_eq!(stats.avg_temp, Some(16.33));
    }
}
