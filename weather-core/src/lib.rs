//! Core library for the `weather` app.
//!
//! This crate defines:
//! - A lazily-initialized JSON API client with an observable transport pipeline
//! - Mapping of OpenWeather responses into the [`WeatherData`] entity
//! - The command-driven [`WeatherOrchestrator`] a view binds to
//! - Configuration and persisted preferences
//!
//! It is used by `weather-cli`, but the orchestrator is UI-agnostic and can be
//! driven by any front end that implements the collaborator traits in
//! [`services`].

pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod mapping;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod services;
pub mod settings;
pub mod transport;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, OPENWEATHER_BASE_URL, REQUEST_TIMEOUT};
pub use command::{AsyncCommand, CommandStatus};
pub use config::Config;
pub use error::{WeatherError, WeatherResult};
pub use model::{Coordinates, Preferences, TemperatureUnit, WeatherData};
pub use orchestrator::{OrchestratorOptions, Services, WeatherOrchestrator, WeatherState};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use settings::{FileSettingsStore, MemorySettingsStore};
