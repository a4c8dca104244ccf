use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::models::ReadingInput;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("payload must be a JSON object")]
    InvalidPayloadType,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field {0} must not be blank")]
    BlankField(&'static str),
}

pub fn parse_reading_bytes(body: &[u8]) -> Result<ReadingInput, ValidationError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|error| ValidationError::InvalidJson(error.to_string()))?;
    parse_reading(&payload)
}

pub fn parse_reading(payload: &Value) -> Result<ReadingInput, ValidationError> {
    let object = payload
        .as_object()
        .ok_or(ValidationError::InvalidPayloadType)?;

    let temperature = required_number(object, "temperature")?;
    let humidity = required_number(object, "humidity")?;
    let rain_value = required_integer(object, "rain_value")?;
    let rain_status = required_text(object, "rain_status")?;

    Ok(ReadingInput {
        temperature,
        humidity,
        rain_value,
        rain_status,
        wind_speed: optional_number(object, "wind_speed")?,
        wind_direction: optional_text(object, "wind_direction")?,
        visibility: optional_number(object, "visibility")?,
    })
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

fn required_number(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    let value = present(object, field).ok_or(ValidationError::MissingField(field))?;
    parse_f64(value).ok_or(ValidationError::InvalidField {
        field,
        expected: "a number",
    })
}

fn optional_number(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    present(object, field)
        .map(|value| {
            parse_f64(value).ok_or(ValidationError::InvalidField {
                field,
                expected: "a number",
            })
        })
        .transpose()
}

fn required_integer(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<i64, ValidationError> {
    let value = present(object, field).ok_or(ValidationError::MissingField(field))?;
    parse_i64(value).ok_or(ValidationError::InvalidField {
        field,
        expected: "an integer",
    })
}

fn required_text(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = present(object, field).ok_or(ValidationError::MissingField(field))?;
    let text = value.as_str().ok_or(ValidationError::InvalidField {
        field,
        expected: "a string",
    })?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }

    Ok(trimmed.to_string())
}

fn optional_text(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = present(object, field) else {
        return Ok(None);
    };

    let text = value.as_str().ok_or(ValidationError::InvalidField {
        field,
        expected: "a string",
    })?;

    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

fn parse_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

fn parse_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && float.fract() == 0.0)
                .filter(|float| float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
