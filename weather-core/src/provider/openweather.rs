use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    api::ApiClient,
    error::WeatherResult,
    mapping::{OwCurrentResponse, map_current},
    model::WeatherData,
};

use super::WeatherProvider;

/// Current weather from OpenWeather's `weather` endpoint, in metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    api: Arc<ApiClient>,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, api: Arc<ApiClient>) -> Self {
        Self { api_key, api }
    }

    async fn fetch_current(&self, endpoint: String) -> WeatherResult<Option<WeatherData>> {
        let parsed = self.api.get::<OwCurrentResponse>(&endpoint).await?;
        Ok(parsed.map(map_current))
    }
}

fn coordinates_endpoint(latitude: f64, longitude: f64, api_key: &str) -> String {
    format!("weather?lat={latitude}&lon={longitude}&appid={api_key}&units=metric")
}

fn city_endpoint(city: &str, api_key: &str) -> String {
    format!(
        "weather?q={}&appid={api_key}&units=metric",
        urlencoding::encode(city)
    )
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> WeatherResult<Option<WeatherData>> {
        self.fetch_current(coordinates_endpoint(latitude, longitude, &self.api_key))
            .await
            .inspect_err(|err| {
                tracing::error!(latitude, longitude, error = %err, "Failed to get weather by coordinates");
            })
    }

    async fn by_city(&self, city: &str) -> WeatherResult<Option<WeatherData>> {
        self.fetch_current(city_endpoint(city, &self.api_key))
            .await
            .inspect_err(|err| {
                tracing::error!(city, error = %err, "Failed to get weather by city");
            })
    }
}
