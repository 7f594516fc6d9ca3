use std::fmt::Debug;

use async_trait::async_trait;

use crate::model::{Location, WeatherReading};

pub mod open_meteo;

/// Resolves a free-text place name to a coordinate.
///
/// `Ok(None)` means the service answered but had no candidate for the
/// query; `Err` covers network, HTTP, and parse failures alike.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, name: &str) -> anyhow::Result<Option<Location>>;
}

/// Fetches current conditions for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, location: &Location) -> anyhow::Result<WeatherReading>;
}
