use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::model::{Humidity, Location, WeatherReading};

use super::{Geocoder, WeatherProvider};

const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";
const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client() -> Result<Client> {
    Client::builder().timeout(REQUEST_TIMEOUT).build().context("Failed to build HTTP client")
}

/// Client for the Open-Meteo geocoding endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new() -> Result<Self> {
        Ok(Self { http: http_client()?, base_url: GEOCODING_BASE_URL.to_string() })
    }

    /// Point the client at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn geocode(&self, name: &str) -> Result<Option<Location>> {
        let url = format!("{}/v1/search", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("name", name), ("count", "1")])
            .send()
            .await
            .context("Failed to send request to Open-Meteo geocoding")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read geocoding response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: GeoResponse =
            serde_json::from_str(&body).context("Failed to parse geocoding JSON")?;

        let Some(candidate) = parsed.results.unwrap_or_default().into_iter().next() else {
            tracing::info!("Geocoding returned no candidate for '{name}'");
            return Ok(None);
        };

        Ok(Some(Location::new(candidate.latitude, candidate.longitude, candidate.name)))
    }
}

/// Client for the Open-Meteo forecast endpoint. Requests current weather
/// (temperature, wind speed) plus the hourly relative-humidity series.
#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    http: Client,
    base_url: String,
}

impl OpenMeteoWeather {
    pub fn new() -> Result<Self> {
        Ok(Self { http: http_client()?, base_url: FORECAST_BASE_URL.to_string() })
    }

    /// Point the client at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    async fn current_weather(&self, location: &Location) -> Result<WeatherReading> {
        let url = format!("{}/v1/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("hourly", "relative_humidity_2m".to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo forecast")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OmForecastResponse =
            serde_json::from_str(&body).context("Failed to parse forecast JSON")?;

        reading_from_response(parsed, &location.display_name)
    }
}

fn reading_from_response(
    response: OmForecastResponse,
    location_name: &str,
) -> Result<WeatherReading> {
    let current = response
        .current_weather
        .ok_or_else(|| anyhow!("Forecast response contained no current weather"))?;

    // A missing humidity series is not an error; the reading carries the
    // sentinel instead.
    let humidity = Humidity::from_sample(
        response
            .hourly
            .and_then(|h| h.relative_humidity_2m)
            .and_then(|series| series.first().copied()),
    );

    Ok(WeatherReading {
        temperature_celsius: current.temperature,
        humidity,
        wind_speed_kmh: current.windspeed,
        location_name: location_name.to_string(),
        fetched_at: Utc::now(),
    })
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    results: Option<Vec<GeoResult>>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    windspeed: f64,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    relative_humidity_2m: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current_weather: Option<OmCurrentWeather>,
    hourly: Option<OmHourly>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
