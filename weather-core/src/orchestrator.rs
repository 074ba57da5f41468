//! Command-driven state machine behind the weather screen.
//!
//! [`WeatherOrchestrator`] owns the observable [`WeatherState`] and exposes one
//! [`AsyncCommand`] per user action. Each command is single-flight; different
//! commands may overlap, in which case the last fetch to complete wins.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::sync::{OnceCell, watch};

use crate::{
    command::AsyncCommand,
    error::WeatherError,
    model::{Preferences, TemperatureUnit, WeatherData},
    provider::WeatherProvider,
    services::{ConnectivityProbe, FeedbackProvider, LocationProvider, SettingsStore, ThemeApplier},
};

pub const EMPTY_SEARCH_MESSAGE: &str = "Please enter a city name";
pub const CITY_NOT_FOUND_MESSAGE: &str = "City not found";
pub const LOCATION_UNAVAILABLE_MESSAGE: &str =
    "Unable to get current location. Please check permissions.";
pub const LOCATION_WEATHER_NOT_FOUND_MESSAGE: &str = "Unable to fetch weather for your location";
pub const OFFLINE_MESSAGE: &str = "No internet connection. Please check your network and try again.";
pub const SAVE_FAILED_PREFIX: &str = "Failed to save preferences";

/// Everything a view binds to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub search_text: String,
    pub is_busy: bool,
    pub is_refreshing: bool,
    pub error_message: String,
    pub weather: Option<WeatherData>,
    pub preferences: Preferences,
}

impl WeatherState {
    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.preferences.unit()
    }

    pub fn temperature_display(&self) -> String {
        self.weather
            .as_ref()
            .map(|w| w.temperature_display(self.unit()))
            .unwrap_or_default()
    }

    pub fn feels_like_display(&self) -> String {
        self.weather
            .as_ref()
            .map(|w| w.feels_like_display(self.unit()))
            .unwrap_or_default()
    }

    pub fn icon_url(&self) -> String {
        self.weather
            .as_ref()
            .map(WeatherData::icon_url)
            .unwrap_or_default()
    }
}

/// Collaborators, constructed once at startup and shared.
#[derive(Debug, Clone)]
pub struct Services {
    pub weather: Arc<dyn WeatherProvider>,
    pub settings: Arc<dyn SettingsStore>,
    pub location: Arc<dyn LocationProvider>,
    pub feedback: Arc<dyn FeedbackProvider>,
    pub theme: Arc<dyn ThemeApplier>,
    pub connectivity: Option<Arc<dyn ConnectivityProbe>>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    /// Search for the last searched city during initialization.
    pub restore_last_search: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            restore_last_search: true,
        }
    }
}

#[derive(Debug)]
pub struct WeatherOrchestrator {
    core: Arc<Core>,
    options: OrchestratorOptions,
    initialized: OnceCell<()>,
    search: AsyncCommand,
    locate: AsyncCommand,
    refresh: AsyncCommand,
    toggle_theme: AsyncCommand,
    toggle_units: AsyncCommand,
}

impl WeatherOrchestrator {
    pub fn new(services: Services, options: OrchestratorOptions) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        let core = Arc::new(Core {
            services,
            state,
            in_flight: AtomicUsize::new(0),
        });

        Self {
            search: bind(&core, "search", |core| async move { core.search().await }),
            locate: bind(&core, "locate", |core| async move { core.locate().await }),
            refresh: bind(&core, "refresh", |core| async move { core.refresh().await }),
            toggle_theme: bind(&core, "toggle_theme", |core| async move {
                core.toggle_theme().await
            }),
            toggle_units: bind(&core, "toggle_units", |core| async move {
                core.toggle_units().await
            }),
            core,
            options,
            initialized: OnceCell::new(),
        }
    }

    /// Construct and run the initialization sequence.
    pub async fn start(services: Services, options: OrchestratorOptions) -> Self {
        let orchestrator = Self::new(services, options);
        orchestrator.initialize().await;
        orchestrator
    }

    /// Load preferences, seed the search text, apply the theme and, when a
    /// last searched city exists, search for it. Runs once; later calls
    /// return immediately.
    pub async fn initialize(&self) {
        self.initialized
            .get_or_init(|| async {
                tracing::info!("weather orchestrator initialization started");
                match self.core.load_preferences().await {
                    Ok(Some(city)) if self.options.restore_last_search => {
                        tracing::debug!(city = %city, "restoring last search");
                        self.search.run().await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = ?err, "error during orchestrator initialization");
                    }
                }
            })
            .await;
    }

    pub fn state(&self) -> WeatherState {
        self.core.state.borrow().clone()
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.core.state.subscribe()
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.core.modify(|s| s.search_text = text);
    }

    /// Set the search text and run the search command.
    pub async fn search_city(&self, city: impl Into<String>) {
        self.set_search_text(city);
        self.search.run().await;
    }

    pub fn search(&self) -> &AsyncCommand {
        &self.search
    }

    pub fn locate(&self) -> &AsyncCommand {
        &self.locate
    }

    pub fn refresh(&self) -> &AsyncCommand {
        &self.refresh
    }

    pub fn toggle_theme(&self) -> &AsyncCommand {
        &self.toggle_theme
    }

    pub fn toggle_units(&self) -> &AsyncCommand {
        &self.toggle_units
    }
}

fn bind<F, Fut>(core: &Arc<Core>, name: &'static str, op: F) -> AsyncCommand
where
    F: Fn(Arc<Core>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let core = Arc::clone(core);
    AsyncCommand::new(name, move || op(Arc::clone(&core)))
}

#[derive(Debug)]
struct Core {
    services: Services,
    state: watch::Sender<WeatherState>,
    in_flight: AtomicUsize,
}

enum FetchTarget<'a> {
    City(&'a str),
    Coordinates(f64, f64),
}

impl Core {
    fn modify(&self, f: impl FnOnce(&mut WeatherState)) {
        self.state.send_modify(f);
    }

    fn snapshot(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    /// Returns the last searched city, if any.
    async fn load_preferences(&self) -> anyhow::Result<Option<String>> {
        let settings = &self.services.settings;
        settings.initialize().await?;

        let prefs = Preferences {
            dark_theme: settings.dark_theme().await?,
            use_celsius: settings.use_celsius().await?,
            last_city: settings.last_city().await?.filter(|c| !c.trim().is_empty()),
        };

        let last_city = prefs.last_city.clone();
        let dark = prefs.dark_theme;
        self.modify(|s| {
            s.search_text = last_city.clone().unwrap_or_default();
            s.preferences = prefs;
        });
        self.services.theme.apply(dark);

        Ok(last_city)
    }

    async fn search(&self) -> anyhow::Result<()> {
        let city = self.snapshot().search_text.trim().to_string();
        if city.is_empty() {
            self.modify(|s| s.error_message = EMPTY_SEARCH_MESSAGE.to_string());
            return Ok(());
        }

        self.clear_error();
        if !self.is_online().await {
            tracing::warn!(city = %city, "no internet connection, search skipped");
            self.fail(OFFLINE_MESSAGE).await;
            return Ok(());
        }

        match self.fetch(FetchTarget::City(&city)).await {
            Ok(Some(weather)) => {
                let persisted = city.clone();
                self.modify(|s| {
                    s.weather = Some(weather);
                    s.preferences.last_city = Some(persisted);
                });
                self.persist_last_city(&city).await;
                self.services.feedback.play_success().await;
            }
            Ok(None) => self.fail(CITY_NOT_FOUND_MESSAGE).await,
            Err(err) => self.fail_with(err).await,
        }

        Ok(())
    }

    async fn locate(&self) -> anyhow::Result<()> {
        self.clear_error();
        if !self.is_online().await {
            tracing::warn!("no internet connection, location lookup skipped");
            self.fail(OFFLINE_MESSAGE).await;
            return Ok(());
        }

        let Some(coords) = self.services.location.current_coordinates().await else {
            self.fail(LOCATION_UNAVAILABLE_MESSAGE).await;
            return Ok(());
        };

        match self
            .fetch(FetchTarget::Coordinates(coords.latitude, coords.longitude))
            .await
        {
            Ok(Some(weather)) => {
                let city = weather.city_name.clone();
                self.modify(|s| {
                    s.search_text = city.clone();
                    s.weather = Some(weather);
                    if !city.is_empty() {
                        s.preferences.last_city = Some(city.clone());
                    }
                });
                if !city.is_empty() {
                    self.persist_last_city(&city).await;
                }
                self.services.feedback.play_success().await;
            }
            Ok(None) => self.fail(LOCATION_WEATHER_NOT_FOUND_MESSAGE).await,
            Err(err) => self.fail_with(err).await,
        }

        Ok(())
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        self.modify(|s| s.is_refreshing = true);
        let _refreshing = RefreshingGuard { core: self };

        if !self.snapshot().search_text.trim().is_empty() {
            self.search().await?;
        }
        Ok(())
    }

    async fn toggle_theme(&self) -> anyhow::Result<()> {
        let mut dark = false;
        self.modify(|s| {
            s.preferences.dark_theme = !s.preferences.dark_theme;
            dark = s.preferences.dark_theme;
        });
        self.services.theme.apply(dark);

        if let Err(err) = self.services.settings.set_dark_theme(dark).await {
            self.modify(|s| s.preferences.dark_theme = !dark);
            self.services.theme.apply(!dark);
            self.fail_to_save(err).await;
        }
        Ok(())
    }

    /// Flip the display unit. Stored temperatures are untouched; the derived
    /// strings on [`WeatherState`] follow the new preference.
    async fn toggle_units(&self) -> anyhow::Result<()> {
        let mut use_celsius = true;
        self.modify(|s| {
            s.preferences.use_celsius = !s.preferences.use_celsius;
            use_celsius = s.preferences.use_celsius;
        });

        if let Err(err) = self.services.settings.set_use_celsius(use_celsius).await {
            self.modify(|s| s.preferences.use_celsius = !use_celsius);
            self.fail_to_save(err).await;
        }
        Ok(())
    }

    /// The preference has already been rolled back; report why.
    async fn fail_to_save(&self, err: anyhow::Error) {
        tracing::error!(error = ?err, "failed to persist preference");
        self.fail(&format!("{SAVE_FAILED_PREFIX}: {err:#}")).await;
    }

    async fn persist_last_city(&self, city: &str) {
        if let Err(err) = self.services.settings.set_last_city(city).await {
            tracing::warn!(error = ?err, "failed to persist last searched city");
        }
    }

    async fn fetch(&self, target: FetchTarget<'_>) -> Result<Option<WeatherData>, WeatherError> {
        let _busy = BusyGuard::enter(self);
        let weather = &self.services.weather;
        match target {
            FetchTarget::City(city) => weather.by_city(city).await,
            FetchTarget::Coordinates(lat, lon) => weather.by_coordinates(lat, lon).await,
        }
    }

    async fn is_online(&self) -> bool {
        match &self.services.connectivity {
            Some(probe) => probe.is_online().await,
            None => true,
        }
    }

    fn clear_error(&self) {
        self.state.send_if_modified(|s| {
            let had_error = !s.error_message.is_empty();
            s.error_message.clear();
            had_error
        });
    }

    async fn fail(&self, message: &str) {
        self.modify(|s| s.error_message = message.to_string());
        self.services.feedback.play_failure().await;
    }

    async fn fail_with(&self, err: WeatherError) {
        tracing::error!(error = %err, "error fetching weather");
        self.fail(&format!("Failed to fetch weather: {err}")).await;
    }
}

/// Keeps `is_busy` true while any fetch is in flight.
struct BusyGuard<'a> {
    core: &'a Core,
}

impl<'a> BusyGuard<'a> {
    fn enter(core: &'a Core) -> Self {
        if core.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            core.modify(|s| s.is_busy = true);
        }
        Self { core }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.core.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.core.modify(|s| s.is_busy = false);
        }
    }
}

struct RefreshingGuard<'a> {
    core: &'a Core,
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.core.modify(|s| s.is_refreshing = false);
    }
}
