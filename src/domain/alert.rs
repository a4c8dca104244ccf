use serde::Serialize;

pub const HEAT_THRESHOLD_C: f64 = 40.0;
pub const STORM_WIND_THRESHOLD_KMH: f64 = 30.0;
pub const LOW_VISIBILITY_THRESHOLD_PCT: f64 = 20.0;

const NO_RAIN: &str = "no rain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLabel {
    #[serde(rename = "Heat Alert")]
    HeatAlert,
    #[serde(rename = "Storm Warning")]
    StormWarning,
    #[serde(rename = "Low Visibility Warning")]
    LowVisibilityWarning,
    #[serde(rename = "Rain Alert")]
    RainAlert,
    #[serde(rename = "Normal")]
    Normal,
}

impl AlertLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeatAlert => "Heat Alert",
            Self::StormWarning => "Storm Warning",
            Self::LowVisibilityWarning => "Low Visibility Warning",
            Self::RainAlert => "Rain Alert",
            Self::Normal => "Normal",
        }
    }
}

impl std::fmt::Display for AlertLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields the classifier looks at. Implemented by both validated input and
/// stored records so the same rules apply everywhere.
pub trait AlertInputs {
    fn temperature(&self) -> f64;
    fn wind_speed(&self) -> Option<f64>;
    fn visibility(&self) -> Option<f64>;
    fn rain_status(&self) -> &str;
}

/// First matching rule wins; the order of the checks below is the priority.
pub fn classify<R: AlertInputs + ?Sized>(reading: &R) -> AlertLabel {
    if reading.temperature() > HEAT_THRESHOLD_C {
        return AlertLabel::HeatAlert;
    }

    if reading
        .wind_speed()
        .is_some_and(|speed| speed > STORM_WIND_THRESHOLD_KMH)
    {
        return AlertLabel::StormWarning;
    }

    if reading
        .visibility()
        .is_some_and(|visibility| visibility < LOW_VISIBILITY_THRESHOLD_PCT)
    {
        return AlertLabel::LowVisibilityWarning;
    }

    if !reading.rain_status().trim().eq_ignore_ascii_case(NO_RAIN) {
        return AlertLabel::RainAlert;
    }

    AlertLabel::Normal
}

impl AlertInputs for crate::domain::models::ReadingInput {
    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn wind_speed(&self) -> Option<f64> {
        self.wind_speed
    }

    fn visibility(&self) -> Option<f64> {
        self.visibility
    }

    fn rain_status(&self) -> &str {
        &self.rain_status
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::models::ReadingInput;

    use super::{AlertLabel, classify};

    fn reading(temperature: f64) -> ReadingInput {
        ReadingInput {
            temperature,
            humidity: 50.0,
            rain_value: 4095,
            rain_status: "No Rain".to_string(),
            wind_speed: None,
            wind_direction: None,
            visibility: None,
        }
    }

    #[test]
    fn heat_wins_over_storm() {
        let mut input = reading(45.0);
        input.wind_speed = Some(50.0);
        assert_eq!(classify(&input), AlertLabel::HeatAlert);
    }

    #[test]
    fn storm_wins_over_visibility_and_rain() {
        let mut input = reading(25.0);
        input.wind_speed = Some(30.5);
        input.visibility = Some(5.0);
        input.rain_status = "Rain".to_string();
        assert_eq!(classify(&input), AlertLabel::StormWarning);
    }

    #[test]
    fn low_visibility_wins_over_rain() {
        let mut input = reading(25.0);
        input.visibility = Some(19.9);
        input.rain_status = "Rain".to_string();
        assert_eq!(classify(&input), AlertLabel::LowVisibilityWarning);
    }

    #[test]
    fn rain_status_is_case_insensitive() {
        let mut input = reading(25.0);
        input.rain_status = "NO RAIN".to_string();
        assert_eq!(classify(&input), AlertLabel::Normal);

        input.rain_status = "Light Rain".to_string();
        assert_eq!(classify(&input), AlertLabel::RainAlert);
    }

    #[test]
    fn thresholds_are_exclusive() {
        let mut input = reading(40.0);
        input.wind_speed = Some(30.0);
        input.visibility = Some(20.0);
        assert_eq!(classify(&input), AlertLabel::Normal);
    }

    #[test]
    fn missing_optional_fields_skip_their_rules() {
        assert_eq!(classify(&reading(22.0)), AlertLabel::Normal);
    }

    #[test]
    fn serializes_as_display_label() {
        let json = serde_json::to_value(AlertLabel::LowVisibilityWarning)
            .expect("label should serialize");
        assert_eq!(json, "Low Visibility Warning");
        assert_eq!(AlertLabel::RainAlert.to_string(), "Rain Alert");
    }
}
