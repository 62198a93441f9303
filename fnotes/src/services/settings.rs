//! Settings service
//!
//! Persists the two user preferences (theme mode and biometric lock) as a
//! JSON file kept outside the notes database. The service is loaded once at
//! startup, injected where needed, and publishes every change to subscribers.

use crate::config::SETTINGS_FILE;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::watch;

/// Colour scheme selection, persisted as an integer 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ThemeMode {
    /// Follow the system (dynamic colours where available)
    #[default]
    Auto,
    Light,
    Dark,
    /// Dark with pure black surfaces
    Black,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 4] = [
        ThemeMode::Auto,
        ThemeMode::Light,
        ThemeMode::Dark,
        ThemeMode::Black,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Auto => "Auto",
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
            ThemeMode::Black => "Black",
        }
    }
}

impl From<i64> for ThemeMode {
    /// Unknown values read as Auto
    fn from(value: i64) -> Self {
        match value {
            1 => ThemeMode::Light,
            2 => ThemeMode::Dark,
            3 => ThemeMode::Black,
            _ => ThemeMode::Auto,
        }
    }
}

impl From<ThemeMode> for i64 {
    fn from(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Auto => 0,
            ThemeMode::Light => 1,
            ThemeMode::Dark => 2,
            ThemeMode::Black => 3,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub theme_mode: ThemeMode,
    #[serde(default)]
    pub biometric_lock: bool,
}

/// Service for reading and updating application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
    current: Arc<watch::Sender<AppSettings>>,
}

impl SettingsService {
    /// Load settings from `app_data_dir`, falling back to defaults when the
    /// file does not exist yet.
    pub async fn load(app_data_dir: PathBuf) -> Result<Self> {
        let settings_path = app_data_dir.join(SETTINGS_FILE);

        let settings = if fs::try_exists(&settings_path).await? {
            let content = fs::read_to_string(&settings_path).await?;
            serde_json::from_str(&content)
                .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))?
        } else {
            tracing::info!("Settings file not found, using defaults");
            AppSettings::default()
        };

        tracing::info!("Loaded settings: {:?}", settings);

        Ok(Self {
            settings_path,
            current: Arc::new(watch::channel(settings).0),
        })
    }

    pub fn current(&self) -> AppSettings {
        *self.current.borrow()
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.current().theme_mode
    }

    pub fn biometric_lock(&self) -> bool {
        self.current().biometric_lock
    }

    /// Receive every settings change after this call
    pub fn subscribe(&self) -> watch::Receiver<AppSettings> {
        self.current.subscribe()
    }

    pub async fn set_theme_mode(&self, theme_mode: ThemeMode) -> Result<()> {
        self.update(|settings| settings.theme_mode = theme_mode).await
    }

    pub async fn set_biometric_lock(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.biometric_lock = enabled).await
    }

    async fn update(&self, change: impl FnOnce(&mut AppSettings)) -> Result<()> {
        let mut settings = self.current();
        change(&mut settings);

        self.save(&settings).await?;
        self.current.send_replace(settings);
        Ok(())
    }

    async fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }
}
