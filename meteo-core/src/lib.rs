//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - The lookup controller and its fallback policy
//! - Clients for the two Open-Meteo endpoints (geocoding, forecast)
//! - Shared domain models and on-disk configuration
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod controller;
pub mod model;
pub mod provider;

pub use config::{Config, FallbackLocation};
pub use controller::{LookupController, LookupError, SearchOutcome};
pub use model::{ControllerState, Humidity, Location, WeatherReading};
pub use provider::{Geocoder, WeatherProvider};
