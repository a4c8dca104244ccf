use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;

use crate::domain::models::{NewReadingRecord, ReadingRecord};

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    temperature REAL NOT NULL,
    humidity REAL NOT NULL,
    rain_value INTEGER,
    rain_status TEXT NOT NULL,
    wind_speed REAL,
    wind_direction TEXT,
    visibility REAL,
    alert TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_readings_created_at
ON readings (created_at);
"#,
)];

const READING_COLUMNS: &str = "id, temperature, humidity, rain_value, rain_status, wind_speed, \
     wind_direction, visibility, alert, created_at";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("invalid stored timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// Opens (and creates if needed) the database file. Used at startup and by
/// tooling, before migrations run.
pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    Ok(connection)
}

/// Opens an already provisioned database without creating it. A missing file
/// is reported as an error instead of silently producing an empty database.
pub fn open_existing_connection(path: &Path) -> Result<Connection, DbError> {
    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    Ok(connection)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Display form used in responses and exports.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stored form. Full precision so a row reads back as the instant the clock
/// produced; fixed width keeps lexical order equal to time order.
fn storage_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| DbError::InvalidTimestamp(raw.to_string()))
}

/// Appends a reading and returns it as stored. `created_at` never moves backwards:
/// if the clock stepped back since the last insert, the previous timestamp is
/// reused so insertion order and time order stay aligned.
pub fn insert_reading(
    connection: &mut Connection,
    new_reading: &NewReadingRecord,
) -> Result<ReadingRecord, DbError> {
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let previous: Option<String> = transaction
        .query_row(
            "SELECT created_at FROM readings ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let mut created_at = new_reading.created_at;
    if let Some(previous) = previous.as_deref().map(parse_timestamp).transpose()?
        && previous > created_at
    {
        tracing::warn!(
            previous = %format_timestamp(previous),
            clock = %format_timestamp(created_at),
            "server clock moved backwards; reusing previous reading timestamp"
        );
        created_at = previous;
    }

    transaction.execute(
        "INSERT INTO readings (temperature, humidity, rain_value, rain_status, wind_speed, wind_direction, visibility, alert, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            new_reading.temperature,
            new_reading.humidity,
            new_reading.rain_value,
            new_reading.rain_status,
            new_reading.wind_speed,
            new_reading.wind_direction,
            new_reading.visibility,
            new_reading.alert.as_str(),
            storage_timestamp(created_at),
        ],
    )?;
    let id = transaction.last_insert_rowid();

    transaction.commit()?;

    Ok(ReadingRecord {
        id,
        temperature: new_reading.temperature,
        humidity: new_reading.humidity,
        rain_value: new_reading.rain_value,
        rain_status: new_reading.rain_status.clone(),
        wind_speed: new_reading.wind_speed,
        wind_direction: new_reading.wind_direction.clone(),
        visibility: new_reading.visibility,
        alert: new_reading.alert.as_str().to_string(),
        created_at,
    })
}

pub fn get_latest_reading(connection: &Connection) -> Result<Option<ReadingRecord>, DbError> {
    Ok(list_recent_readings(connection, 1)?.into_iter().next())
}

/// Newest first, at most `limit` rows.
pub fn list_recent_readings(
    connection: &Connection,
    limit: u32,
) -> Result<Vec<ReadingRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {READING_COLUMNS}
         FROM readings
         ORDER BY id DESC
         LIMIT ?1"
    ))?;

    let rows = statement.query_map(params![i64::from(limit)], RawReading::from_row)?;
    collect_readings(rows)
}

/// Oldest first, every reading with `from <= created_at <= until`.
pub fn list_readings_between(
    connection: &Connection,
    from_inclusive: DateTime<Utc>,
    until_inclusive: DateTime<Utc>,
) -> Result<Vec<ReadingRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {READING_COLUMNS}
         FROM readings
         WHERE created_at >= ?1 AND created_at <= ?2
         ORDER BY created_at ASC, id ASC"
    ))?;

    let rows = statement.query_map(
        params![
            storage_timestamp(from_inclusive),
            storage_timestamp(until_inclusive)
        ],
        RawReading::from_row,
    )?;
    collect_readings(rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSummary {
    pub count: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

pub fn summarize_readings(connection: &Connection) -> Result<ReadingSummary, DbError> {
    let (count, oldest, newest): (i64, Option<String>, Option<String>) = connection.query_row(
        "SELECT COUNT(*), MIN(created_at), MAX(created_at) FROM readings",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(ReadingSummary {
        count: u64::try_from(count).unwrap_or_default(),
        oldest: oldest.as_deref().map(parse_timestamp).transpose()?,
        newest: newest.as_deref().map(parse_timestamp).transpose()?,
    })
}

struct RawReading {
    id: i64,
    temperature: f64,
    humidity: f64,
    rain_value: Option<i64>,
    rain_status: String,
    wind_speed: Option<f64>,
    wind_direction: Option<String>,
    visibility: Option<f64>,
    alert: String,
    created_at: String,
}

impl RawReading {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            temperature: row.get(1)?,
            humidity: row.get(2)?,
            rain_value: row.get(3)?,
            rain_status: row.get(4)?,
            wind_speed: row.get(5)?,
            wind_direction: row.get(6)?,
            visibility: row.get(7)?,
            alert: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<ReadingRecord, DbError> {
        Ok(ReadingRecord {
            id: self.id,
            temperature: self.temperature,
            humidity: self.humidity,
            rain_value: self.rain_value,
            rain_status: self.rain_status,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            visibility: self.visibility,
            alert: self.alert,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn collect_readings(
    rows: impl Iterator<Item = rusqlite::Result<RawReading>>,
) -> Result<Vec<ReadingRecord>, DbError> {
    let mut readings = Vec::new();
    for row in rows {
        readings.push(row?.into_record()?);
    }

    Ok(readings)
}
