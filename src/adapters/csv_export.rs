use crate::adapters::db::format_timestamp;
use crate::domain::models::ReadingRecord;

pub const EXPORT_FILENAME: &str = "weather_export.csv";

pub const EXPORT_HEADER: &[&str] = &[
    "timestamp",
    "temperature",
    "humidity",
    "rain_status",
    "wind_speed",
    "wind_direction",
    "visibility",
];

pub fn render_csv(readings: &[ReadingRecord]) -> String {
    let mut output = EXPORT_HEADER.join(",");
    output.push('\n');

    for reading in readings {
        let cells = [
            format_timestamp(reading.created_at),
            reading.temperature.to_string(),
            reading.humidity.to_string(),
            escape_cell(&reading.rain_status),
            format_optional(reading.wind_speed),
            reading
                .wind_direction
                .as_deref()
                .map(escape_cell)
                .unwrap_or_default(),
            format_optional(reading.visibility),
        ];
        output.push_str(&cells.join(","));
        output.push('\n');
    }

    output
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|number| number.to_string()).unwrap_or_default()
}

fn escape_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
