use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::app::services::{ReadingCommandHandler, ReadingQueryHandler, ServiceError};
use crate::domain::alert::classify;
use crate::domain::history::{HistoryMode, TemperatureSample, TimeBucket};
use crate::domain::models::{NewReadingRecord, ReadingRecord};
use crate::domain::snapshot::{LatestSnapshot, latest_snapshot};
use crate::domain::statistics::STATS_WINDOW;
use crate::domain::telemetry_payload::{ValidationError, parse_reading_bytes};

pub const EXPORT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid reading: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Validates a raw ingestion body, classifies it and appends it to the store.
/// Nothing is written when validation fails.
pub fn ingest_reading<S>(
    store: &S,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<ReadingRecord, TelemetryError>
where
    S: ReadingCommandHandler + ?Sized,
{
    let input = parse_reading_bytes(body)?;
    let alert = classify(&input);
    let stored = store.insert_reading(&NewReadingRecord::from_input(input, alert, now))?;

    tracing::info!(
        reading_id = stored.id,
        temperature = stored.temperature,
        humidity = stored.humidity,
        alert = %alert,
        "reading persisted"
    );

    Ok(stored)
}

pub fn latest<S>(store: &S, now: DateTime<Utc>) -> Result<LatestSnapshot, TelemetryError>
where
    S: ReadingQueryHandler + ?Sized,
{
    let recent = store.recent_readings(STATS_WINDOW as u32)?;
    Ok(latest_snapshot(&recent, now))
}

pub fn history<S>(
    store: &S,
    mode: HistoryMode,
    now: DateTime<Utc>,
) -> Result<Vec<TimeBucket>, TelemetryError>
where
    S: ReadingQueryHandler + ?Sized,
{
    let readings = store.readings_between(mode.window_start(now), now)?;
    let samples: Vec<TemperatureSample> = readings
        .iter()
        .map(|reading| TemperatureSample {
            at: reading.created_at,
            temperature: reading.temperature,
        })
        .collect();

    Ok(mode.bucketize(&samples, now))
}

/// Readings of the trailing export window, oldest first.
pub fn export_readings<S>(
    store: &S,
    now: DateTime<Utc>,
) -> Result<Vec<ReadingRecord>, TelemetryError>
where
    S: ReadingQueryHandler + ?Sized,
{
    let from = now - TimeDelta::days(EXPORT_WINDOW_DAYS);
    Ok(store.readings_between(from, now)?)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::{DateTime, TimeDelta, Utc};

    use crate::app::services::{
        ReadingCommandHandler, ReadingQueryHandler, ServiceError, SqliteReadingService,
    };
    use crate::domain::history::HistoryMode;
    use crate::domain::models::{NewReadingRecord, ReadingRecord};
    use crate::domain::snapshot::LatestSnapshot;
    use crate::domain::trend::Trend;
    use crate::test_support::{at, test_db_path};

    use super::{TelemetryError, export_readings, history, ingest_reading, latest};

    #[derive(Default)]
    struct RecordingStore {
        inserted: RefCell<Vec<NewReadingRecord>>,
    }

    impl ReadingCommandHandler for RecordingStore {
        fn insert_reading(
            &self,
            new_reading: &NewReadingRecord,
        ) -> Result<ReadingRecord, ServiceError> {
            self.inserted.borrow_mut().push(new_reading.clone());
            Ok(ReadingRecord {
                id: self.inserted.borrow().len() as i64,
                temperature: new_reading.temperature,
                humidity: new_reading.humidity,
                rain_value: new_reading.rain_value,
                rain_status: new_reading.rain_status.clone(),
                wind_speed: new_reading.wind_speed,
                wind_direction: new_reading.wind_direction.clone(),
                visibility: new_reading.visibility,
                alert: new_reading.alert.as_str().to_string(),
                created_at: new_reading.created_at,
            })
        }
    }

    fn body(temperature: f64, wind_speed: Option<f64>) -> Vec<u8> {
        serde_json::json!({
            "temperature": temperature,
            "humidity": 50,
            "rain_value": 4095,
            "rain_status": "No Rain",
            "wind_speed": wind_speed,
        })
        .to_string()
        .into_bytes()
    }

    fn ingest_at(store: &SqliteReadingService, temperature: f64, now: DateTime<Utc>) {
        ingest_reading(store, &body(temperature, None), now).expect("ingest should succeed");
    }

    #[test]
    fn ingest_classifies_and_stamps_with_server_time() {
        let store = RecordingStore::default();
        let now = at("2026-03-01T12:00:00Z");

        let stored = ingest_reading(&store, &body(45.0, Some(50.0)), now)
            .expect("ingest should succeed");

        assert_eq!(stored.alert, "Heat Alert");
        assert_eq!(stored.created_at, now);
        assert_eq!(store.inserted.borrow().len(), 1);
    }

    #[test]
    fn invalid_payload_writes_nothing() {
        let store = RecordingStore::default();

        let result = ingest_reading(&store, br#"{"temperature": 20}"#, at("2026-03-01T12:00:00Z"));

        assert!(matches!(result, Err(TelemetryError::Validation(_))));
        assert!(store.inserted.borrow().is_empty());
    }

    #[test]
    fn latest_reports_trend_over_recent_readings() {
        let store = SqliteReadingService::new(test_db_path("telemetry-latest"));
        let start = at("2026-03-01T12:00:00Z");

        for (offset, temperature) in [15.0, 15.0, 18.0, 20.0, 20.0].into_iter().enumerate() {
            ingest_at(&store, temperature, start + TimeDelta::seconds(5 * offset as i64));
        }

        let snapshot = latest(&store, start + TimeDelta::seconds(25)).expect("latest should succeed");
        let LatestSnapshot::Online { reading, trend, .. } = snapshot else {
            panic!("expected online snapshot");
        };
        assert_eq!(reading.temperature, 20.0);
        assert_eq!(trend, Trend::Rising);
    }

    #[test]
    fn latest_is_no_data_on_empty_store() {
        let store = SqliteReadingService::new(test_db_path("telemetry-empty"));
        let snapshot = latest(&store, at("2026-03-01T12:00:00Z")).expect("latest should succeed");
        assert_eq!(snapshot, LatestSnapshot::NoData);
    }

    #[test]
    fn history_only_reads_the_mode_window() {
        let store = SqliteReadingService::new(test_db_path("telemetry-history"));
        let now = at("2026-03-08T12:30:00Z");

        ingest_at(&store, 30.0, at("2026-03-01T10:00:00Z"));
        ingest_at(&store, 10.0, at("2026-03-05T10:00:00Z"));
        ingest_at(&store, 12.0, at("2026-03-08T11:15:00Z"));
        ingest_at(&store, 14.0, at("2026-03-08T11:45:00Z"));

        let hourly = history(&store, HistoryMode::Hourly, now).expect("history should succeed");
        assert_eq!(hourly.len(), 12);
        assert_eq!(hourly[10].bucket_start, at("2026-03-08T11:00:00Z"));
        assert_eq!(hourly[10].avg_temperature, Some(13.0));
        assert_eq!(
            hourly
                .iter()
                .filter(|bucket| bucket.avg_temperature.is_some())
                .count(),
            1
        );

        let daily = history(&store, HistoryMode::Daily, now).expect("history should succeed");
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].avg_temperature, Some(10.0));
        assert_eq!(daily[1].avg_temperature, Some(13.0));

        let again = history(&store, HistoryMode::Daily, now).expect("history should succeed");
        assert_eq!(daily, again);
    }

    #[test]
    fn export_covers_trailing_seven_days() {
        let store = SqliteReadingService::new(test_db_path("telemetry-export"));
        let now = at("2026-03-08T12:00:00Z");

        ingest_at(&store, 1.0, at("2026-03-01T11:59:59Z"));
        ingest_at(&store, 2.0, at("2026-03-01T12:00:00Z"));
        ingest_at(&store, 3.0, at("2026-03-08T11:00:00Z"));

        let rows = export_readings(&store, now).expect("export should succeed");
        let temperatures: Vec<f64> = rows.iter().map(|row| row.temperature).collect();
        assert_eq!(temperatures, vec![2.0, 3.0]);
        assert_eq!(
            store.latest_reading().expect("query should succeed").map(|row| row.temperature),
            Some(3.0)
        );
    }
}
