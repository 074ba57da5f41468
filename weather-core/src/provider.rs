use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::WeatherResult, model::WeatherData};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Source of current-weather observations.
///
/// `Ok(None)` means the request completed but carried no weather payload.
/// Transport and decode failures are returned as errors, never swallowed.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> WeatherResult<Option<WeatherData>>;

    async fn by_city(&self, city: &str) -> WeatherResult<Option<WeatherData>>;
}
