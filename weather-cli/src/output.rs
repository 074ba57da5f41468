//! Human-readable rendering of the orchestrator state.

use std::fmt::Write;

use chrono::Local;
use weather_core::WeatherState;

/// Color palette picked from the applied theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Plain,
    Light,
    Dark,
}

impl Palette {
    pub fn for_theme(dark: bool, colored: bool) -> Self {
        match (colored, dark) {
            (false, _) => Palette::Plain,
            (true, true) => Palette::Dark,
            (true, false) => Palette::Light,
        }
    }

    fn heading(&self, text: &str) -> String {
        match self {
            Palette::Plain => text.to_string(),
            Palette::Light => format!("\x1b[1;34m{text}\x1b[0m"),
            Palette::Dark => format!("\x1b[1;96m{text}\x1b[0m"),
        }
    }
}

/// Render the current observation. Empty when nothing has been fetched.
pub fn render_weather(state: &WeatherState, palette: Palette) -> String {
    let Some(weather) = state.weather.as_ref() else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", palette.heading(&weather.location_label()));
    let _ = writeln!(
        out,
        "  {}, feels like {}",
        state.temperature_display(),
        state.feels_like_display()
    );

    match (weather.main_condition.is_empty(), weather.description.is_empty()) {
        (true, true) => {}
        (false, true) => {
            let _ = writeln!(out, "  {}", weather.main_condition);
        }
        (true, false) => {
            let _ = writeln!(out, "  {}", weather.description);
        }
        (false, false) => {
            let _ = writeln!(out, "  {}: {}", weather.main_condition, weather.description);
        }
    }

    let _ = writeln!(
        out,
        "  Humidity {}%   Wind {:.1} m/s   Pressure {} hPa",
        weather.humidity_pct, weather.wind_speed_mps, weather.pressure_hpa
    );
    let _ = writeln!(
        out,
        "  Observed {}",
        weather
            .observed_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M %Z")
    );

    let icon = state.icon_url();
    if !icon.is_empty() {
        let _ = writeln!(out, "  Icon {icon}");
    }

    out
}
