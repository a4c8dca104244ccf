use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::models::{NewReadingRecord, ReadingRecord};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] DbError),
    #[error("database operation failed: {0}")]
    Storage(#[source] DbError),
}

pub trait ReadingQueryHandler {
    fn latest_reading(&self) -> Result<Option<ReadingRecord>, ServiceError>;
    /// Newest first, at most `limit` readings.
    fn recent_readings(&self, limit: u32) -> Result<Vec<ReadingRecord>, ServiceError>;
    /// Oldest first, readings created in `[from_inclusive, until_inclusive]`.
    fn readings_between(
        &self,
        from_inclusive: DateTime<Utc>,
        until_inclusive: DateTime<Utc>,
    ) -> Result<Vec<ReadingRecord>, ServiceError>;
}

pub trait ReadingCommandHandler {
    fn insert_reading(&self, new_reading: &NewReadingRecord)
    -> Result<ReadingRecord, ServiceError>;
}

/// Reading store backed by a SQLite file. Holds only the path; every
/// operation opens its own connection, so nothing but the file outlives a
/// request.
#[derive(Debug, Clone)]
pub struct SqliteReadingService {
    db_path: PathBuf,
}

impl SqliteReadingService {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, DbError>,
    ) -> Result<T, ServiceError> {
        let mut connection = db::open_existing_connection(&self.db_path)
            .map_err(ServiceError::StorageUnavailable)?;
        op(&mut connection).map_err(ServiceError::Storage)
    }
}

impl ReadingQueryHandler for SqliteReadingService {
    fn latest_reading(&self) -> Result<Option<ReadingRecord>, ServiceError> {
        self.with_connection(|connection| db::get_latest_reading(connection))
    }

    fn recent_readings(&self, limit: u32) -> Result<Vec<ReadingRecord>, ServiceError> {
        self.with_connection(|connection| db::list_recent_readings(connection, limit))
    }

    fn readings_between(
        &self,
        from_inclusive: DateTime<Utc>,
        until_inclusive: DateTime<Utc>,
    ) -> Result<Vec<ReadingRecord>, ServiceError> {
        self.with_connection(|connection| {
            db::list_readings_between(connection, from_inclusive, until_inclusive)
        })
    }
}

impl ReadingCommandHandler for SqliteReadingService {
    fn insert_reading(
        &self,
        new_reading: &NewReadingRecord,
    ) -> Result<ReadingRecord, ServiceError> {
        self.with_connection(|connection| db::insert_reading(connection, new_reading))
    }
}
