//! OpenWeather "current weather" schema and its translation into [`WeatherData`].
//!
//! Every field is optional on the wire. Missing numbers become zero and a
//! missing or empty `weather` list leaves the description fields empty, so a
//! sparse response still maps to a (sparse) entity.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::WeatherData;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OwCurrentResponse {
    pub name: Option<String>,
    pub dt: Option<i64>,
    pub sys: Option<OwSys>,
    pub main: Option<OwMain>,
    pub wind: Option<OwWind>,
    pub weather: Option<Vec<OwWeather>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OwSys {
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OwMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<u8>,
    pub pressure: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OwWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OwWeather {
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Map one API response into the internal entity. Never fails.
pub fn map_current(response: OwCurrentResponse) -> WeatherData {
    let main = response.main.unwrap_or_default();
    let condition = response
        .weather
        .and_then(|list| list.into_iter().next())
        .unwrap_or_default();

    WeatherData {
        city_name: response.name.unwrap_or_default(),
        country: response.sys.and_then(|s| s.country).unwrap_or_default(),
        temperature_c: main.temp.unwrap_or_default(),
        feels_like_c: main.feels_like.unwrap_or_default(),
        description: condition.description.unwrap_or_default(),
        main_condition: condition.main.unwrap_or_default(),
        humidity_pct: main.humidity.unwrap_or_default(),
        wind_speed_mps: response.wind.and_then(|w| w.speed).unwrap_or_default(),
        pressure_hpa: main.pressure.unwrap_or_default(),
        icon_code: condition.icon.unwrap_or_default(),
        observed_at: unix_to_utc(response.dt.unwrap_or_default()),
    }
}

/// Unix seconds to UTC; out-of-range values collapse to the epoch.
fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}
