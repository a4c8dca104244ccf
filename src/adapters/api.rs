use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

use crate::adapters::csv_export::{EXPORT_FILENAME, render_csv};
use crate::adapters::db::format_timestamp;
use crate::app::services::{ServiceError, SqliteReadingService};
use crate::app::telemetry::{self, TelemetryError};
use crate::domain::history::HistoryMode;
use crate::domain::liveness::{Clock, DeviceStatus};
use crate::domain::snapshot::LatestSnapshot;
use crate::domain::trend::Trend;

#[derive(Clone)]
pub struct ApiState {
    pub readings: SqliteReadingService,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct IngestResponse {
    pub status: &'static str,
    pub id: i64,
    pub alert: String,
}

#[derive(Debug, Serialize, PartialEq, Default)]
pub struct LatestResponse {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rain: Option<String>,
    pub rain_value: Option<i64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<String>,
    pub visibility: Option<f64>,
    pub alert: Option<String>,
    pub trend: Option<Trend>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub avg_temp: Option<f64>,
    pub device_status: Option<DeviceStatus>,
    pub time: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HistoryPoint {
    pub time: String,
    pub temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub mode: Option<String>,
}

impl From<LatestSnapshot> for LatestResponse {
    fn from(snapshot: LatestSnapshot) -> Self {
        let device_status = Some(snapshot.device_status());
        match snapshot {
            LatestSnapshot::NoData => Self {
                device_status,
                ..Self::default()
            },
            LatestSnapshot::Offline { last_seen } => Self {
                device_status,
                time: Some(format_timestamp(last_seen)),
                ..Self::default()
            },
            LatestSnapshot::Online {
                reading,
                trend,
                stats,
            } => Self {
                temperature: Some(reading.temperature),
                humidity: Some(reading.humidity),
                rain: Some(reading.rain_status),
                rain_value: reading.rain_value,
                wind_speed: reading.wind_speed,
                wind_direction: reading.wind_direction,
                visibility: reading.visibility,
                alert: Some(reading.alert),
                trend: Some(trend),
                min_temp: stats.min_temp,
                max_temp: stats.max_temp,
                avg_temp: stats.avg_temp,
                device_status,
                time: Some(format_timestamp(reading.created_at)),
            },
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(ingest_reading_endpoint)
        .service(get_latest_endpoint)
        .service(get_history_endpoint)
        .service(export_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/api/data")]
async fn ingest_reading_endpoint(state: web::Data<ApiState>, body: web::Bytes) -> HttpResponse {
    match telemetry::ingest_reading(&state.readings, &body, state.clock.now()) {
        Ok(stored) => HttpResponse::Ok().json(IngestResponse {
            status: "ok",
            id: stored.id,
            alert: stored.alert,
        }),
        Err(error) => error_response(&error),
    }
}

#[get("/api/data")]
async fn get_latest_endpoint(state: web::Data<ApiState>) -> HttpResponse {
    match telemetry::latest(&state.readings, state.clock.now()) {
        Ok(snapshot) => HttpResponse::Ok().json(LatestResponse::from(snapshot)),
        Err(error) => error_response(&error),
    }
}

#[get("/api/history")]
async fn get_history_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    let requested_mode = query.mode.as_deref().map(str::trim).filter(|mode| !mode.is_empty());
    let mode = match requested_mode.map(str::parse::<HistoryMode>) {
        None => HistoryMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(error)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": error.to_string()
            }));
        }
    };

    match telemetry::history(&state.readings, mode, state.clock.now()) {
        Ok(buckets) => {
            let points: Vec<HistoryPoint> = buckets
                .into_iter()
                .map(|bucket| HistoryPoint {
                    time: bucket
                        .bucket_start
                        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                    temperature: bucket.avg_temperature,
                })
                .collect();
            HttpResponse::Ok().json(points)
        }
        Err(error) => error_response(&error),
    }
}

#[get("/api/export")]
async fn export_endpoint(state: web::Data<ApiState>) -> HttpResponse {
    match telemetry::export_readings(&state.readings, state.clock.now()) {
        Ok(readings) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(EXPORT_FILENAME.to_string())],
            })
            .body(render_csv(&readings)),
        Err(error) => error_response(&error),
    }
}

/// Error kind to HTTP status. Server-side failures get a generic body; the
/// details go to the log only.
fn status_for(error: &TelemetryError) -> StatusCode {
    match error {
        TelemetryError::Validation(_) => StatusCode::BAD_REQUEST,
        TelemetryError::Service(ServiceError::StorageUnavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        TelemetryError::Service(ServiceError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &TelemetryError) -> HttpResponse {
    let status = status_for(error);
    let message = match error {
        TelemetryError::Validation(validation) => {
            tracing::warn!(error = %validation, "rejected reading payload");
            error.to_string()
        }
        TelemetryError::Service(ServiceError::StorageUnavailable(_)) => {
            tracing::error!(error = %error, "storage unavailable");
            "storage unavailable".to_string()
        }
        TelemetryError::Service(ServiceError::Storage(_)) => {
            tracing::error!(error = %error, "storage operation failed");
            "internal server error".to_string()
        }
    };

    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}
