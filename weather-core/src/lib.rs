//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider behind the `WeatherProvider` abstraction
//! - Shared domain models (snapshots, air quality, units)
//! - The session store (state + reducer) and the fetch coordinator driving it
//! - Display formatters
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod coordinator;
pub mod format;
pub mod model;
pub mod provider;
pub mod store;

pub use config::Config;
pub use coordinator::{FetchCoordinator, FetchOutcome};
pub use model::{AirQuality, Coordinates, Unit, WeatherSnapshot};
pub use provider::{ProviderError, WeatherProvider, openweather::OpenWeatherProvider};
pub use store::{Action, Phase, Screen, SearchHistory, SessionState, Store};
