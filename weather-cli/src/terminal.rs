//! Terminal-side implementations of the orchestrator's collaborators.

use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use weather_core::{
    Coordinates,
    services::{FeedbackProvider, LocationProvider, ThemeApplier},
};

/// Location taken from `--lat/--lon`. Without both, or with values out of
/// range, the position is unavailable.
#[derive(Debug, Default)]
pub struct FixedLocation {
    coordinates: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        let coordinates = match (latitude, longitude) {
            (Some(lat), Some(lon))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
            {
                Some(Coordinates::new(lat, lon))
            }
            (Some(lat), Some(lon)) => {
                tracing::warn!(lat, lon, "coordinates out of range");
                None
            }
            _ => None,
        };
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}

/// Rings the terminal bell on failure. Never fails.
#[derive(Debug, Default)]
pub struct TerminalFeedback;

#[async_trait]
impl FeedbackProvider for TerminalFeedback {
    async fn play_success(&self) {
        tracing::debug!("weather fetched");
    }

    async fn play_failure(&self) {
        let mut stderr = std::io::stderr();
        if let Err(err) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            tracing::debug!(error = %err, "failed to ring terminal bell");
        }
    }
}

/// Remembers the requested theme; output styling reads it back.
#[derive(Debug, Default)]
pub struct TerminalTheme {
    dark: AtomicBool,
}

impl TerminalTheme {
    pub fn is_dark(&self) -> bool {
        self.dark.load(Ordering::SeqCst)
    }
}

impl ThemeApplier for TerminalTheme {
    fn apply(&self, dark: bool) {
        self.dark.store(dark, Ordering::SeqCst);
    }
}
