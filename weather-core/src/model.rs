use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ICON_URL_PREFIX: &str = "https://openweathermap.org/img/wn/";

/// One successfully fetched weather observation.
///
/// Temperatures are always stored in Celsius; the unit the user picked only
/// changes how [`WeatherData::temperature_display`] renders them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherData {
    pub city_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub description: String,
    pub main_condition: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub pressure_hpa: u32,
    pub icon_code: String,
    pub observed_at: DateTime<Utc>,
}

impl WeatherData {
    /// Icon image for the observation, or an empty string without an icon code.
    pub fn icon_url(&self) -> String {
        if self.icon_code.is_empty() {
            String::new()
        } else {
            format!("{ICON_URL_PREFIX}{}@2x.png", self.icon_code)
        }
    }

    pub fn temperature_display(&self, unit: TemperatureUnit) -> String {
        unit.format(self.temperature_c)
    }

    pub fn feels_like_display(&self, unit: TemperatureUnit) -> String {
        unit.format(self.feels_like_c)
    }

    /// "Paris, FR", or just the city when the country is unknown.
    pub fn location_label(&self) -> String {
        if self.country.is_empty() {
            self.city_name.clone()
        } else {
            format!("{}, {}", self.city_name, self.country)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius_flag(use_celsius: bool) -> Self {
        if use_celsius {
            TemperatureUnit::Celsius
        } else {
            TemperatureUnit::Fahrenheit
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Whole degrees with the unit suffix, e.g. `15°C`.
    pub fn format(&self, celsius: f64) -> String {
        // `+ 0.0` folds -0 into 0 so "-0°C" is never shown.
        let value = self.convert(celsius).round() + 0.0;
        format!("{value:.0}{}", self.symbol())
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("Celsius"),
            TemperatureUnit::Fahrenheit => f.write_str("Fahrenheit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// User preferences persisted through the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub dark_theme: bool,
    pub use_celsius: bool,
    pub last_city: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_theme: false,
            use_celsius: true,
            last_city: None,
        }
    }
}

impl Preferences {
    pub fn unit(&self) -> TemperatureUnit {
        TemperatureUnit::from_celsius_flag(self.use_celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherData {
        WeatherData {
            city_name: "Paris".into(),
            country: "FR".into(),
            temperature_c: 15.2,
            feels_like_c: 14.6,
            icon_code: "01d".into(),
            ..WeatherData::default()
        }
    }

    #[test]
    fn icon_url_uses_icon_code() {
        assert_eq!(
            sample().icon_url(),
            "https://openweathermap.org/img/wn/01d@2x.png"
        );
    }

    #[test]
    fn icon_url_is_empty_without_icon_code() {
        let data = WeatherData {
            icon_code: String::new(),
            ..sample()
        };
        assert_eq!(data.icon_url(), "");
    }

    #[test]
    fn temperature_display_converts_without_touching_storage() {
        let data = sample();

        assert_eq!(data.temperature_display(TemperatureUnit::Celsius), "15°C");
        assert_eq!(data.temperature_display(TemperatureUnit::Fahrenheit), "59°F");
        assert_eq!(data.feels_like_display(TemperatureUnit::Fahrenheit), "58°F");
        assert_eq!(data.temperature_c, 15.2);
    }

    #[test]
    fn freezing_point_and_negative_zero() {
        assert_eq!(TemperatureUnit::Fahrenheit.format(0.0), "32°F");
        assert_eq!(TemperatureUnit::Celsius.format(-0.3), "0°C");
        assert_eq!(TemperatureUnit::Fahrenheit.format(-40.0), "-40°F");
    }

    #[test]
    fn location_label_omits_missing_country() {
        assert_eq!(sample().location_label(), "Paris, FR");

        let data = WeatherData {
            country: String::new(),
            ..sample()
        };
        assert_eq!(data.location_label(), "Paris");
    }

    #[test]
    fn default_preferences_use_celsius_and_light_theme() {
        let prefs = Preferences::default();
        assert!(prefs.use_celsius);
        assert!(!prefs.dark_theme);
        assert_eq!(prefs.last_city, None);
        assert_eq!(prefs.unit(), TemperatureUnit::Celsius);
    }
}
