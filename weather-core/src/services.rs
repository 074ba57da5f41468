//! Collaborators the orchestrator talks to but does not implement.

use std::fmt::Debug;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::Coordinates;

/// Durable user preferences. Every setter is expected to persist immediately.
#[async_trait]
pub trait SettingsStore: Send + Sync + Debug {
    async fn initialize(&self) -> Result<()>;

    async fn dark_theme(&self) -> Result<bool>;
    async fn set_dark_theme(&self, value: bool) -> Result<()>;

    async fn use_celsius(&self) -> Result<bool>;
    async fn set_use_celsius(&self, value: bool) -> Result<()>;

    async fn last_city(&self) -> Result<Option<String>>;
    async fn set_last_city(&self, city: &str) -> Result<()>;
}

/// Current device position. Permission and provider failures are reported as
/// `None`, never as errors.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn current_coordinates(&self) -> Option<Coordinates>;
}

/// Best-effort success/failure cue (sound, vibration, bell...).
#[async_trait]
pub trait FeedbackProvider: Send + Sync + Debug {
    async fn play_success(&self);
    async fn play_failure(&self);
}

pub trait ThemeApplier: Send + Sync + Debug {
    fn apply(&self, dark: bool);
}

/// Optional network reachability check run before fetching.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + Debug {
    async fn is_online(&self) -> bool;
}
