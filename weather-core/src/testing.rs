//! Fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::{
    error::{WeatherError, WeatherResult},
    model::{Coordinates, WeatherData},
    provider::WeatherProvider,
    services::{ConnectivityProbe, FeedbackProvider, LocationProvider, SettingsStore, ThemeApplier},
    settings::MemorySettingsStore,
    transport::{ApiRequest, ApiResponse, ExchangeObserver, Transport},
};

type ErrorFactory = Box<dyn Fn() -> WeatherError + Send + Sync>;

#[derive(Default)]
pub struct FakeTransport {
    queued: Mutex<VecDeque<(u16, String)>>,
    fallback: Mutex<Option<(u16, String)>>,
    failure: Mutex<Option<ErrorFactory>>,
    requests: Mutex<Vec<String>>,
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport").finish_non_exhaustive()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response.
    pub fn respond(&self, status: u16, body: &str) {
        self.queued
            .lock()
            .unwrap()
            .push_back((status, body.to_string()));
    }

    /// Response used once the queue is empty.
    pub fn respond_always(&self, status: u16, body: &str) {
        *self.fallback.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn fail_with(&self, error: impl Fn() -> WeatherError + Send + Sync + 'static) {
        *self.failure.lock().unwrap() = Some(Box::new(error));
    }

    /// "METHOD url" for every request seen.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> WeatherResult<ApiResponse> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));

        if let Some(error) = self.failure.lock().unwrap().as_ref() {
            return Err(error());
        }

        let next = self.queued.lock().unwrap().pop_front();
        let (status, body) = next
            .or_else(|| self.fallback.lock().unwrap().clone())
            .expect("FakeTransport has no response queued");

        Ok(ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<(String, String, u16, String)>>,
}

impl RecordingObserver {
    pub fn exchanges(&self) -> Vec<(String, String, u16, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl ExchangeObserver for RecordingObserver {
    fn observe(&self, request: &ApiRequest, response: &ApiResponse) {
        self.seen.lock().unwrap().push((
            request.method.to_string(),
            request.url.to_string(),
            response.status.as_u16(),
            response.body.clone(),
        ));
    }
}

/// Scripted outcome of a [`FakeWeatherProvider`] call.
#[derive(Debug, Clone)]
pub enum Reply {
    Found(WeatherData),
    Absent,
    HttpError(u16, String),
}

/// Provider returning scripted replies. With `hold()`, each call parks until
/// `release()` so tests can observe in-flight state.
#[derive(Debug, Default)]
pub struct FakeWeatherProvider {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<String>>,
    hold: AtomicBool,
    gate: Notify,
    entered: Notify,
}

impl FakeWeatherProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Resolves once a held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    async fn answer(&self, call: String) -> WeatherResult<Option<WeatherData>> {
        self.calls.lock().unwrap().push(call);
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.notified().await;
        }

        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Absent);
        match reply {
            Reply::Found(data) => Ok(Some(data)),
            Reply::Absent => Ok(None),
            Reply::HttpError(status, body) => Err(WeatherError::Transport { status, body }),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeatherProvider {
    async fn by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> WeatherResult<Option<WeatherData>> {
        self.answer(format!("coords {latitude},{longitude}")).await
    }

    async fn by_city(&self, city: &str) -> WeatherResult<Option<WeatherData>> {
        self.answer(format!("city {city}")).await
    }
}

#[derive(Debug, Default)]
pub struct FakeLocation {
    pub coordinates: Mutex<Option<Coordinates>>,
}

impl FakeLocation {
    pub fn at(latitude: f64, longitude: f64) -> Arc<Self> {
        Arc::new(Self {
            coordinates: Mutex::new(Some(Coordinates::new(latitude, longitude))),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    async fn current_coordinates(&self) -> Option<Coordinates> {
        *self.coordinates.lock().unwrap()
    }
}

#[derive(Debug, Default)]
pub struct FakeFeedback {
    pub successes: AtomicUsize,
    pub failures: AtomicUsize,
}

impl FakeFeedback {
    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackProvider for FakeFeedback {
    async fn play_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    async fn play_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct FakeTheme {
    pub applied: Mutex<Vec<bool>>,
}

impl FakeTheme {
    pub fn applied(&self) -> Vec<bool> {
        self.applied.lock().unwrap().clone()
    }
}

impl ThemeApplier for FakeTheme {
    fn apply(&self, dark: bool) {
        self.applied.lock().unwrap().push(dark);
    }
}

#[derive(Debug)]
pub struct FakeConnectivity(pub AtomicBool);

#[async_trait]
impl ConnectivityProbe for FakeConnectivity {
    async fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings whose reads succeed and whose writes always fail.
#[derive(Debug)]
pub struct ReadOnlySettings(pub Arc<MemorySettingsStore>);

#[async_trait]
impl SettingsStore for ReadOnlySettings {
    async fn initialize(&self) -> anyhow::Result<()> {
        self.0.initialize().await
    }

    async fn dark_theme(&self) -> anyhow::Result<bool> {
        self.0.dark_theme().await
    }

    async fn set_dark_theme(&self, _value: bool) -> anyhow::Result<()> {
        anyhow::bail!("settings store is read-only")
    }

    async fn use_celsius(&self) -> anyhow::Result<bool> {
        self.0.use_celsius().await
    }

    async fn set_use_celsius(&self, _value: bool) -> anyhow::Result<()> {
        anyhow::bail!("settings store is read-only")
    }

    async fn last_city(&self) -> anyhow::Result<Option<String>> {
        self.0.last_city().await
    }

    async fn set_last_city(&self, _city: &str) -> anyhow::Result<()> {
        anyhow::bail!("settings store is read-only")
    }
}

pub fn paris() -> WeatherData {
    WeatherData {
        city_name: "Paris".into(),
        country: "FR".into(),
        temperature_c: 15.2,
        feels_like_c: 14.1,
        description: "clear sky".into(),
        main_condition: "Clear".into(),
        humidity_pct: 72,
        wind_speed_mps: 3.6,
        pressure_hpa: 1015,
        icon_code: "01d".into(),
        ..WeatherData::default()
    }
}
