//! [`SettingsStore`] implementations.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::{config::Config, model::Preferences, services::SettingsStore};

/// Process-local preferences; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    prefs: Mutex<Preferences>,
}

impl MemorySettingsStore {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }

    pub fn snapshot(&self) -> Preferences {
        lock(&self.prefs).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn dark_theme(&self) -> Result<bool> {
        Ok(lock(&self.prefs).dark_theme)
    }

    async fn set_dark_theme(&self, value: bool) -> Result<()> {
        lock(&self.prefs).dark_theme = value;
        Ok(())
    }

    async fn use_celsius(&self) -> Result<bool> {
        Ok(lock(&self.prefs).use_celsius)
    }

    async fn set_use_celsius(&self, value: bool) -> Result<()> {
        lock(&self.prefs).use_celsius = value;
        Ok(())
    }

    async fn last_city(&self) -> Result<Option<String>> {
        Ok(lock(&self.prefs).last_city.clone())
    }

    async fn set_last_city(&self, city: &str) -> Result<()> {
        lock(&self.prefs).last_city = Some(city.to_string());
        Ok(())
    }
}

/// Preferences stored in the `[preferences]` table of the config file.
///
/// Every setter rewrites the file immediately. Keys outside `[preferences]`
/// (API key, base URL) are preserved as they were when the store was
/// initialized. Until [`SettingsStore::initialize`] has loaded the file,
/// getters return defaults and setters fail without touching the disk.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    config: tokio::sync::Mutex<Option<Config>>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: tokio::sync::Mutex::new(None),
        }
    }

    /// Store over the platform config file.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::config_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T>(&self, f: impl FnOnce(&Preferences) -> T) -> T {
        match self.config.lock().await.as_ref() {
            Some(config) => f(&config.preferences),
            None => f(&Preferences::default()),
        }
    }

    /// Apply `f` and persist. The lock is held across the write so concurrent
    /// setters never interleave their files.
    async fn update(&self, f: impl FnOnce(&mut Preferences)) -> Result<()> {
        let mut guard = self.config.lock().await;
        // Writing from defaults would drop the API key and base URL.
        let Some(config) = guard.as_mut() else {
            bail!(
                "Settings were not loaded from {}; refusing to overwrite it",
                self.path.display()
            );
        };
        f(&mut config.preferences);

        let contents = config.to_toml()?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        tokio::fs::write(&self.path, contents)
            .await
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn initialize(&self) -> Result<()> {
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || Config::load_from(&path))
            .await
            .context("Settings loader task failed")??;

        *self.config.lock().await = Some(loaded);
        Ok(())
    }

    async fn dark_theme(&self) -> Result<bool> {
        Ok(self.read(|p| p.dark_theme).await)
    }

    async fn set_dark_theme(&self, value: bool) -> Result<()> {
        self.update(|p| p.dark_theme = value).await
    }

    async fn use_celsius(&self) -> Result<bool> {
        Ok(self.read(|p| p.use_celsius).await)
    }

    async fn set_use_celsius(&self, value: bool) -> Result<()> {
        self.update(|p| p.use_celsius = value).await
    }

    async fn last_city(&self) -> Result<Option<String>> {
        Ok(self.read(|p| p.last_city.clone()).await)
    }

    async fn set_last_city(&self, city: &str) -> Result<()> {
        let city = city.to_string();
        self.update(move |p| p.last_city = Some(city)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_defaults_and_updates() {
        let store = MemorySettingsStore::default();
        store.initialize().await.unwrap();

        assert!(!store.dark_theme().await.unwrap());
        assert!(store.use_celsius().await.unwrap());
        assert_eq!(store.last_city().await.unwrap(), None);

        store.set_dark_theme(true).await.unwrap();
        store.set_use_celsius(false).await.unwrap();
        store.set_last_city("Lisbon").await.unwrap();

        assert_eq!(
            store.snapshot(),
            Preferences {
                dark_theme: true,
                use_celsius: false,
                last_city: Some("Lisbon".into()),
            }
        );
    }

    #[tokio::test]
    async fn file_store_writes_through_and_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather").join("config.toml");

        let store = FileSettingsStore::new(&path);
        store.initialize().await.unwrap();
        store.set_last_city("Paris").await.unwrap();

        // Written immediately, no flush needed.
        let on_disk = Config::load_from(&path).unwrap();
        assert_eq!(on_disk.preferences.last_city.as_deref(), Some("Paris"));

        store.set_use_celsius(false).await.unwrap();
        drop(store);

        let reopened = FileSettingsStore::new(&path);
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.last_city().await.unwrap().as_deref(), Some("Paris"));
        assert!(!reopened.use_celsius().await.unwrap());
        assert!(!reopened.dark_theme().await.unwrap());
    }

    #[tokio::test]
    async fn file_store_preserves_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("SECRET".into());
        cfg.save_to(&path).unwrap();

        let store = FileSettingsStore::new(&path);
        store.initialize().await.unwrap();
        store.set_dark_theme(true).await.unwrap();

        let on_disk = Config::load_from(&path).unwrap();
        assert_eq!(on_disk.api_key.as_deref(), Some("SECRET"));
        assert!(on_disk.preferences.dark_theme);
    }

    #[tokio::test]
    async fn file_store_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "preferences = 3").unwrap();

        let err = FileSettingsStore::new(&path).initialize().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn file_store_never_overwrites_a_file_it_could_not_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = "api_key = \"SECRET\"\n\n[preferences]\nuse_celsius = \"yes\"\n";
        std::fs::write(&path, original).unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(store.initialize().await.is_err());
        assert!(store.use_celsius().await.unwrap());

        let err = store.set_dark_theme(true).await.unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn file_store_setters_fail_before_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let store = FileSettingsStore::new(&path);
        assert!(store.set_last_city("Paris").await.is_err());
        assert!(!path.exists());
    }
}
