use std::{io::IsTerminal, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{
    ApiClient, Config, FileSettingsStore, OpenWeatherProvider, OrchestratorOptions, Services,
    WeatherOrchestrator, WeatherState,
};

use crate::{
    output::{Palette, render_weather},
    terminal::{FixedLocation, TerminalFeedback, TerminalTheme},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "Paris" or "London,GB".
        city: String,
    },

    /// Show current weather at a position.
    Locate {
        /// Latitude in degrees.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude in degrees.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
    },

    /// Fetch the last searched city again.
    Refresh,

    /// Switch between Celsius and Fahrenheit.
    Units,

    /// Switch between light and dark output.
    Theme,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let action = match self.command {
            Command::Configure => return configure(),
            Command::Show { city } => Action::Show(city),
            Command::Locate { lat, lon } => Action::Locate { lat, lon },
            Command::Refresh => Action::Refresh,
            Command::Units => Action::Units,
            Command::Theme => Action::Theme,
        };
        run_action(action).await
    }
}

/// Commands that go through the orchestrator.
#[derive(Debug)]
enum Action {
    Show(String),
    Locate { lat: Option<f64>, lon: Option<f64> },
    Refresh,
    Units,
    Theme,
}

impl Action {
    /// Toggles never hit the network, so they work before `configure`.
    fn needs_api_key(&self) -> bool {
        !matches!(self, Action::Units | Action::Theme)
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn run_action(action: Action) -> anyhow::Result<()> {
    let config = Config::load()?;

    let api_key = if action.needs_api_key() {
        config.resolve_api_key()?
    } else {
        config.resolve_api_key().unwrap_or_default()
    };

    let (lat, lon) = match action {
        Action::Locate { lat, lon } => (lat, lon),
        _ => (None, None),
    };

    let api = Arc::new(ApiClient::new(config.base_url())?);
    let theme = Arc::new(TerminalTheme::default());
    let services = Services {
        weather: Arc::new(OpenWeatherProvider::new(api_key, api)),
        settings: Arc::new(FileSettingsStore::default_location()?),
        location: Arc::new(FixedLocation::new(lat, lon)),
        feedback: Arc::new(TerminalFeedback),
        theme: theme.clone(),
        connectivity: None,
    };

    // Every action issues its own fetch; don't restore the last search as well.
    let options = OrchestratorOptions {
        restore_last_search: false,
    };
    let vm = WeatherOrchestrator::start(services, options).await;

    match action {
        Action::Show(city) => vm.search_city(city).await,
        Action::Locate { .. } => vm.locate().run().await,
        Action::Refresh => {
            if vm.state().search_text.is_empty() {
                bail!(
                    "No city searched yet.\n\
                     Hint: run `weather show <CITY>` first."
                );
            }
            vm.refresh().run().await;
        }
        Action::Units => {
            vm.toggle_units().run().await;
            return report_preference(&vm.state(), |s| {
                format!("Temperature unit: {}", s.unit())
            });
        }
        Action::Theme => {
            vm.toggle_theme().run().await;
            return report_preference(&vm.state(), |s| {
                let name = if s.preferences.dark_theme { "dark" } else { "light" };
                format!("Theme: {name}")
            });
        }
    }

    report(&vm.state(), &theme)
}

/// Print the toggled preference, unless saving it failed.
fn report_preference(
    state: &WeatherState,
    describe: impl FnOnce(&WeatherState) -> String,
) -> anyhow::Result<()> {
    if state.has_error() {
        bail!("{}", state.error_message);
    }
    println!("{}", describe(state));
    Ok(())
}

fn report(state: &WeatherState, theme: &TerminalTheme) -> anyhow::Result<()> {
    if state.has_error() {
        bail!("{}", state.error_message);
    }

    let palette = Palette::for_theme(theme.is_dark(), std::io::stdout().is_terminal());
    print!("{}", render_weather(state, palette));
    Ok(())
}
