use thiserror::Error;

use crate::model::{ControllerState, Location, WeatherReading};
use crate::provider::{Geocoder, WeatherProvider};

/// Which path produced the result of one completed `search` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Query text was empty; no request was made.
    Skipped,
    /// The reading came from the geocoded location.
    Resolved,
    /// The reading came from the fallback location.
    Fallback,
}

/// Terminal failure: a weather fetch that already targeted the fallback
/// location failed, so there is nothing left to retry.
#[derive(Debug, Error)]
#[error("error fetching weather data for {location}: {reason}")]
pub struct LookupError {
    pub location: String,
    pub reason: String,
}

/// Orchestrates the geocode-then-fetch cycle and the fallback policy.
///
/// Holds the only state in the system: the query text, the last successful
/// reading, and the error flag. Error conditions below it (network, HTTP
/// status, malformed JSON, missing fields) all collapse into the same
/// fallback path; the controller never distinguishes them.
#[derive(Debug)]
pub struct LookupController {
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherProvider>,
    fallback: Location,
    state: ControllerState,
}

impl LookupController {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        weather: Box<dyn WeatherProvider>,
        fallback: Location,
    ) -> Self {
        Self { geocoder, weather, fallback, state: ControllerState::default() }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn fallback(&self) -> &Location {
        &self.fallback
    }

    /// Pure state update; nothing is validated and nothing is fetched.
    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.state.query_text = text.into();
    }

    /// Run one lookup cycle for the current query text.
    ///
    /// An empty query is a no-op. A geocoder miss or failure reroutes to
    /// the fallback location without touching the error flag; a weather
    /// failure for a geocoded location sets the error flag and retries the
    /// fallback coordinate exactly once. A failure of a fetch that already
    /// targeted the fallback is terminal.
    pub async fn search(&mut self) -> Result<SearchOutcome, LookupError> {
        if self.state.query_text.is_empty() {
            return Ok(SearchOutcome::Skipped);
        }

        let query = self.state.query_text.clone();
        let geocoded = self.geocoder.geocode(&query).await;
        let (target, origin) = match geocoded {
            Ok(Some(location)) => (location, SearchOutcome::Resolved),
            Ok(None) => {
                tracing::info!("No geocoding match for '{query}', using fallback location");
                (self.fallback.clone(), SearchOutcome::Fallback)
            }
            Err(err) => {
                tracing::warn!("Geocoding failed for '{query}', using fallback location: {err:#}");
                (self.fallback.clone(), SearchOutcome::Fallback)
            }
        };

        self.load_weather(target, origin).await
    }

    async fn load_weather(
        &mut self,
        location: Location,
        origin: SearchOutcome,
    ) -> Result<SearchOutcome, LookupError> {
        let fetched = self.weather.current_weather(&location).await;
        match fetched {
            Ok(reading) => {
                self.store_reading(reading);
                Ok(origin)
            }
            Err(err) if origin == SearchOutcome::Resolved => {
                // Single forced retry against the fallback coordinate.
                self.state.has_error = true;
                tracing::warn!(
                    "Weather fetch failed for {}, retrying fallback location: {err:#}",
                    location.display_name
                );

                let fallback = self.fallback.clone();
                let retried = self.weather.current_weather(&fallback).await;
                match retried {
                    Ok(reading) => {
                        self.store_reading(reading);
                        Ok(SearchOutcome::Fallback)
                    }
                    Err(retry_err) => Err(self.terminal(&fallback, &retry_err)),
                }
            }
            Err(err) => Err(self.terminal(&location, &err)),
        }
    }

    /// A success reported by either fetch clears the error flag; the flag
    /// reflects only the most recent fetch attempt's outcome.
    fn store_reading(&mut self, reading: WeatherReading) {
        self.state.last_reading = Some(reading);
        self.state.has_error = false;
    }

    fn terminal(&mut self, location: &Location, err: &anyhow::Error) -> LookupError {
        self.state.has_error = true;
        tracing::error!("Fallback weather fetch failed for {}: {err:#}", location.display_name);
        LookupError { location: location.display_name.clone(), reason: format!("{err:#}") }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::model::Humidity;

    fn paris() -> Location {
        Location::new(48.8566, 2.3522, "Paris")
    }

    #[derive(Debug, Clone, Copy)]
    enum GeoStep {
        Hit,
        Miss,
        Fail,
    }

    #[derive(Debug)]
    struct ScriptedGeocoder {
        step: GeoStep,
        queries: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn geocode(&self, name: &str) -> anyhow::Result<Option<Location>> {
            self.queries.lock().unwrap().push(name.to_string());
            match self.step {
                GeoStep::Hit => Ok(Some(paris())),
                GeoStep::Miss => Ok(None),
                GeoStep::Fail => Err(anyhow!("geocoder down")),
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum WeatherStep {
        Reading(f64),
        Fail,
    }

    #[derive(Debug)]
    struct ScriptedWeather {
        script: Mutex<VecDeque<WeatherStep>>,
        calls: Arc<Mutex<Vec<Location>>>,
    }

    #[async_trait]
    impl WeatherProvider for ScriptedWeather {
        async fn current_weather(&self, location: &Location) -> anyhow::Result<WeatherReading> {
            self.calls.lock().unwrap().push(location.clone());
            let step =
                self.script.lock().unwrap().pop_front().unwrap_or(WeatherStep::Reading(20.0));
            match step {
                WeatherStep::Reading(temp) => Ok(WeatherReading {
                    temperature_celsius: temp,
                    humidity: Humidity::Percent(40.0),
                    wind_speed_kmh: 10.0,
                    location_name: location.display_name.clone(),
                    fetched_at: Utc::now(),
                }),
                WeatherStep::Fail => Err(anyhow!("weather endpoint down")),
            }
        }
    }

    struct Harness {
        controller: LookupController,
        geo_queries: Arc<Mutex<Vec<String>>>,
        weather_calls: Arc<Mutex<Vec<Location>>>,
    }

    fn harness(geo: GeoStep, script: Vec<WeatherStep>) -> Harness {
        let geo_queries = Arc::new(Mutex::new(Vec::new()));
        let weather_calls = Arc::new(Mutex::new(Vec::new()));

        let controller = LookupController::new(
            Box::new(ScriptedGeocoder { step: geo, queries: Arc::clone(&geo_queries) }),
            Box::new(ScriptedWeather {
                script: Mutex::new(script.into()),
                calls: Arc::clone(&weather_calls),
            }),
            Location::fallback(),
        );

        Harness { controller, geo_queries, weather_calls }
    }

    #[tokio::test]
    async fn empty_query_is_a_no_op() {
        let mut h = harness(GeoStep::Hit, vec![]);

        h.controller.set_query_text("");
        let outcome = h.controller.search().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Skipped);
        assert!(h.geo_queries.lock().unwrap().is_empty());
        assert!(h.weather_calls.lock().unwrap().is_empty());
        assert!(h.controller.state().last_reading.is_none());
    }

    #[tokio::test]
    async fn resolved_city_fetches_weather_exactly_once() {
        let mut h = harness(GeoStep::Hit, vec![WeatherStep::Reading(25.0)]);

        h.controller.set_query_text("Paris");
        let outcome = h.controller.search().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Resolved);
        assert_eq!(h.geo_queries.lock().unwrap().as_slice(), ["Paris"]);
        assert_eq!(h.weather_calls.lock().unwrap().as_slice(), [paris()]);

        let reading = h.controller.state().last_reading.as_ref().unwrap();
        assert_eq!(reading.temperature_celsius, 25.0);
        assert_eq!(reading.location_name, "Paris");
        assert!(!h.controller.state().has_error);
    }

    #[tokio::test]
    async fn geocoder_miss_uses_fallback_without_error() {
        let mut h = harness(GeoStep::Miss, vec![WeatherStep::Reading(31.0)]);

        h.controller.set_query_text("Zzzzz");
        let outcome = h.controller.search().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Fallback);
        assert_eq!(h.weather_calls.lock().unwrap().as_slice(), [Location::fallback()]);
        assert!(!h.controller.state().has_error);

        let reading = h.controller.state().last_reading.as_ref().unwrap();
        assert_eq!(reading.location_name, "Dholpur");
    }

    #[tokio::test]
    async fn geocoder_failure_uses_fallback_without_error() {
        let mut h = harness(GeoStep::Fail, vec![WeatherStep::Reading(31.0)]);

        h.controller.set_query_text("Paris");
        let outcome = h.controller.search().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Fallback);
        assert_eq!(h.weather_calls.lock().unwrap().as_slice(), [Location::fallback()]);
        assert!(!h.controller.state().has_error);
    }

    #[tokio::test]
    async fn primary_failure_retries_fallback_exactly_once() {
        let mut h = harness(GeoStep::Hit, vec![WeatherStep::Fail, WeatherStep::Reading(31.0)]);

        h.controller.set_query_text("Paris");
        let outcome = h.controller.search().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Fallback);
        let calls = h.weather_calls.lock().unwrap();
        assert_eq!(calls.as_slice(), [paris(), Location::fallback()]);

        let reading = h.controller.state().last_reading.as_ref().unwrap();
        assert_eq!(reading.temperature_celsius, 31.0);
        assert_eq!(reading.location_name, "Dholpur");
    }

    #[tokio::test]
    async fn fallback_success_clears_error_flag() {
        let mut h = harness(GeoStep::Hit, vec![WeatherStep::Fail, WeatherStep::Reading(31.0)]);

        h.controller.set_query_text("Paris");
        h.controller.search().await.unwrap();

        assert!(!h.controller.state().has_error);
    }

    #[tokio::test]
    async fn fallback_failure_is_terminal() {
        let mut h = harness(GeoStep::Hit, vec![WeatherStep::Fail, WeatherStep::Fail]);

        h.controller.set_query_text("Paris");
        let err = h.controller.search().await.unwrap_err();

        assert_eq!(err.location, "Dholpur");
        assert_eq!(h.weather_calls.lock().unwrap().len(), 2);
        assert!(h.controller.state().has_error);
        assert!(h.controller.state().last_reading.is_none());
    }

    #[tokio::test]
    async fn direct_fallback_failure_does_not_retry() {
        let mut h = harness(GeoStep::Miss, vec![WeatherStep::Fail]);

        h.controller.set_query_text("Zzzzz");
        let err = h.controller.search().await.unwrap_err();

        assert_eq!(err.location, "Dholpur");
        assert_eq!(h.weather_calls.lock().unwrap().len(), 1);
        assert!(h.controller.state().has_error);
    }

    #[tokio::test]
    async fn later_search_supersedes_earlier_reading() {
        let mut h =
            harness(GeoStep::Hit, vec![WeatherStep::Reading(25.0), WeatherStep::Reading(12.0)]);

        h.controller.set_query_text("Paris");
        h.controller.search().await.unwrap();
        h.controller.search().await.unwrap();

        let reading = h.controller.state().last_reading.as_ref().unwrap();
        assert_eq!(reading.temperature_celsius, 12.0);
    }

    #[tokio::test]
    async fn terminal_error_message_is_generic() {
        let mut h = harness(GeoStep::Miss, vec![WeatherStep::Fail]);

        h.controller.set_query_text("Zzzzz");
        let err = h.controller.search().await.unwrap_err();

        assert!(err.to_string().starts_with("error fetching weather data"));
    }
}
