use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

pub const OFFLINE_AFTER_SECS: i64 = 30;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Liveness {
    Online,
    Offline,
}

/// Device status as reported to clients. `NoData` means nothing was ever
/// ingested, which is not the same as a device that went quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceStatus {
    Online,
    Offline,
    #[serde(rename = "No Data")]
    NoData,
}

impl From<Liveness> for DeviceStatus {
    fn from(value: Liveness) -> Self {
        match value {
            Liveness::Online => Self::Online,
            Liveness::Offline => Self::Offline,
        }
    }
}

pub fn liveness(last_reading_at: DateTime<Utc>, now: DateTime<Utc>) -> Liveness {
    if now.signed_duration_since(last_reading_at) > TimeDelta::seconds(OFFLINE_AFTER_SECS) {
        Liveness::Offline
    } else {
        Liveness::Online
    }
}

pub fn device_status(last_reading_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DeviceStatus {
    last_reading_at.map_or(DeviceStatus::NoData, |last| liveness(last, now).into())
}
