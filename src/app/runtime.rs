use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use chrono::{DateTime, Utc};

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::db;
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::services::SqliteReadingService;
use crate::domain::liveness::Clock;

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Creates the database file if needed and brings the schema up to date. The
/// connection is closed again; request handlers open their own.
pub fn prepare_database(db_path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(AppError::database_init)?;
    }

    let mut connection = db::open_connection(db_path).map_err(AppError::database_init)?;
    db::run_migrations(&mut connection).map_err(AppError::database_init)?;
    let version = db::schema_version(&connection).map_err(AppError::database_init)?;

    tracing::info!(db_path, schema_version = version, "database ready");
    Ok(())
}

fn build_cors(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(["GET", "POST"])
            .allow_any_header()
            .expose_headers(["content-disposition"]),
        None => Cors::permissive(),
    }
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    prepare_database(&config.db_path)?;

    let api_state = ApiState {
        readings: SqliteReadingService::new(&config.db_path),
        clock: Arc::new(SystemClock),
    };
    let cors_allowed_origin = config.cors_allowed_origin.clone();

    tracing::info!(bind = %config.http_bind, "http server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            let mut server = HttpServer::new(move || {
                App::new()
                    .wrap(build_cors(cors_allowed_origin.as_deref()))
                    .app_data(web::Data::new(api_state.clone()))
                    .configure(configure_routes)
            });

            if let Some(workers) = config.http_workers {
                server = server.workers(workers);
            }

            server.bind(&config.http_bind)?.run().await
        })
        .map_err(AppError::runtime)
}
