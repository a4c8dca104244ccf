mod config;
mod error;
mod logging;
mod runtime;
pub mod services;
pub mod telemetry;

pub use error::AppError;
pub use runtime::prepare_database;

pub fn run_api() -> Result<(), AppError> {
    let env_file = dotenvy::dotenv().ok();
    logging::init()?;

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let config = config::AppConfig::from_env()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        http_workers = ?config.http_workers,
        cors_allowed_origin = ?config.cors_allowed_origin,
        "application bootstrap initialized"
    );

    runtime::run(config)
}
