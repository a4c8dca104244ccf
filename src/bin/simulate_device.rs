use std::f64::consts::TAU;
use std::thread;
use std::time::Duration;

use chrono::{Timelike, Utc};
use serde::Serialize;
use serde_json::Value;

const DEFAULT_URL: &str = "http://127.0.0.1:5000/api/data";
const DEFAULT_INTERVAL_SECS: u64 = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const WIND_DIRECTIONS: &[&str] = &["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

#[derive(Debug)]
struct Options {
    url: String,
    interval: Duration,
    count: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DevicePayload {
    temperature: f64,
    humidity: f64,
    rain_value: i64,
    rain_status: &'static str,
    wind_speed: f64,
    wind_direction: &'static str,
    visibility: f64,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("device simulator failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args()? else {
        return Ok(());
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|error| error.to_string())?;

    println!(
        "posting synthetic readings to {} every {}s",
        options.url,
        options.interval.as_secs()
    );

    let mut sent = 0_u64;
    loop {
        let payload = synthesize(sent);
        match post_reading(&client, &options.url, &payload) {
            Ok(alert) => println!(
                "[{}] #{sent} temperature={:.1} humidity={:.1} -> {alert}",
                Utc::now().to_rfc3339(),
                payload.temperature,
                payload.humidity
            ),
            Err(error) => println!("[{}] #{sent} FAILED: {error}", Utc::now().to_rfc3339()),
        }

        sent += 1;
        if options.count.is_some_and(|count| sent >= count) {
            return Ok(());
        }
        thread::sleep(options.interval);
    }
}

fn post_reading(
    client: &reqwest::blocking::Client,
    url: &str,
    payload: &DevicePayload,
) -> Result<String, String> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .map_err(|error| error.to_string())?;

    let status = response.status();
    let body: Value = response.json().map_err(|error| error.to_string())?;

    if !status.is_success() {
        return Err(format!("{status}: {body}"));
    }

    Ok(body["alert"].as_str().unwrap_or("unknown").to_string())
}

/// Daily temperature curve with a small per-sample wobble, so the dashboard
/// shows trends in both directions.
fn synthesize(sequence: u64) -> DevicePayload {
    let now = Utc::now();
    let day_fraction = f64::from(now.num_seconds_from_midnight()) / 86_400.0;
    let wobble = ((sequence % 7) as f64 - 3.0) * 0.15;

    let temperature = 18.0 + 8.0 * (TAU * (day_fraction - 0.25)).sin() + wobble;
    let humidity = (65.0 - 1.5 * (temperature - 18.0)).clamp(5.0, 100.0);
    let raining = (sequence / 30) % 5 == 4;

    DevicePayload {
        temperature: (temperature * 10.0).round() / 10.0,
        humidity: (humidity * 10.0).round() / 10.0,
        rain_value: if raining { 1800 } else { 4095 },
        rain_status: if raining { "Rain" } else { "No Rain" },
        wind_speed: 6.0 + (sequence % 11) as f64,
        wind_direction: WIND_DIRECTIONS[(sequence as usize / 6) % WIND_DIRECTIONS.len()],
        visibility: if raining { 45.0 } else { 90.0 },
    }
}

fn parse_args() -> Result<Option<Options>, String> {
    let mut options = Options {
        url: DEFAULT_URL.to_string(),
        interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        count: None,
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--url" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--url requires a value".to_string());
                };
                options.url = value.clone();
                index += 2;
            }
            "--interval-secs" => {
                let seconds = args
                    .get(index + 1)
                    .and_then(|value| value.parse::<u64>().ok())
                    .filter(|seconds| *seconds > 0)
                    .ok_or_else(|| "--interval-secs requires a positive number".to_string())?;
                options.interval = Duration::from_secs(seconds);
                index += 2;
            }
            "--count" => {
                let count = args
                    .get(index + 1)
                    .and_then(|value| value.parse::<u64>().ok())
                    .ok_or_else(|| "--count requires a number".to_string())?;
                options.count = Some(count);
                index += 2;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    Ok(Some(options))
}

fn print_help() {
    println!("simulate_device");
    println!();
    println!("Usage:");
    println!(
        "  cargo run --bin simulate_device -- [--url <url>] [--interval-secs <n>] [--count <n>]"
    );
    println!();
    println!("Options:");
    println!("  --url <url>            ingestion endpoint (default: {DEFAULT_URL})");
    println!("  --interval-secs <n>    seconds between readings (default: {DEFAULT_INTERVAL_SECS})");
    println!("  --count <n>            stop after n readings (default: run forever)");
}
