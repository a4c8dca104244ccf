use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use weather_station_api::adapters::db::{
    ReadingSummary, format_timestamp, open_existing_connection, schema_version,
    summarize_readings,
};
use weather_station_api::app::prepare_database;
use weather_station_api::domain::liveness::device_status;

const DEFAULT_DB_PATH: &str = "/var/lib/weather/weather.db";

fn main() {
    if let Err(error) = run() {
        eprintln!("db_status: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    dotenvy::dotenv().ok();

    let mut path = std::env::var("DB_PATH")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let mut migrate = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--path" => path = args.next().ok_or("--path requires a value")?,
            "--migrate" => migrate = true,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    if migrate {
        prepare_database(&path).map_err(|error| error.to_string())?;
    }

    let connection = open_existing_connection(Path::new(&path)).map_err(|error| error.to_string())?;
    let version = schema_version(&connection).map_err(|error| error.to_string())?;
    let summary = summarize_readings(&connection).map_err(|error| error.to_string())?;

    print!("{}", render_report(&path, version, &summary, Utc::now()));
    Ok(())
}

fn render_report(
    path: &str,
    version: u32,
    summary: &ReadingSummary,
    now: DateTime<Utc>,
) -> String {
    let describe =
        |value: Option<DateTime<Utc>>| value.map_or_else(|| "-".to_string(), format_timestamp);
    let status = serde_json::to_value(device_status(summary.newest, now))
        .ok()
        .and_then(|value| value.as_str().map(ToString::to_string))
        .unwrap_or_default();

    let mut report = String::new();
    let _ = writeln!(report, "database:       {path}");
    let _ = writeln!(report, "schema version: {version}");
    let _ = writeln!(report, "readings:       {}", summary.count);
    let _ = writeln!(report, "oldest reading: {}", describe(summary.oldest));
    let _ = writeln!(report, "newest reading: {}", describe(summary.newest));
    let _ = writeln!(report, "device status:  {status}");
    report
}

fn print_help() {
    println!("db_status");
    println!();
    println!("Usage:");
    println!("  cargo run --bin db_status -- [--path <file>] [--migrate]");
    println!();
    println!("Options:");
    println!("  --path <file>   sqlite file to inspect (default: $DB_PATH or {DEFAULT_DB_PATH})");
    println!("  --migrate       create the file and apply pending migrations first");
}
