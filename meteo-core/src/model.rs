use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A coordinate pair plus the name shown to the user.
///
/// Immutable once constructed: one hardcoded fallback instance exists, all
/// others come from geocoding responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self { latitude, longitude, display_name: display_name.into() }
    }

    /// Built-in location used whenever geocoding or the primary weather
    /// fetch fails and no override is configured.
    pub fn fallback() -> Self {
        Self::new(26.6966, 77.8908, "Dholpur")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.display_name, self.latitude, self.longitude)
    }
}

/// Relative humidity in percent, or the sentinel for a response that lacked
/// the hourly humidity series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Humidity {
    Percent(f64),
    Unknown,
}

impl Humidity {
    /// First sample of the hourly series, if the response carried one.
    pub fn from_sample(sample: Option<f64>) -> Self {
        match sample {
            Some(pct) => Self::Percent(pct),
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for Humidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(pct) => write!(f, "{pct} %"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Current conditions for one location. Constructed fresh per successful
/// fetch and superseded by the next one; no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_celsius: f64,
    pub humidity: Humidity,
    pub wind_speed_kmh: f64,
    pub location_name: String,
    pub fetched_at: DateTime<Utc>,
}

/// The only mutable state in the system, owned by the lookup controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub query_text: String,
    pub last_reading: Option<WeatherReading>,
    pub has_error: bool,
}
