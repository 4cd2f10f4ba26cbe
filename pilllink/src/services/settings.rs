//! Settings service
//!
//! Manages client settings persistence using JSON file storage.

use crate::config::{
    DEFAULT_API_BASE_URL, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TOLERANCE_MINUTES,
    MAX_POLL_INTERVAL_SECS, MAX_TOLERANCE_MINUTES, MIN_POLL_INTERVAL_SECS,
};
use crate::error::{AppError, Result};
use crate::schedule::MarkerOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Session token issued at sign-in
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_token: None,
        }
    }
}

/// Reminder window and runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Half-width of the due window in minutes
    #[serde(default = "default_tolerance_minutes")]
    pub tolerance_minutes: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Member the runner watches; `None` is the account's default member
    #[serde(default)]
    pub target_member_id: Option<i64>,
}

fn default_tolerance_minutes() -> u32 {
    DEFAULT_TOLERANCE_MINUTES
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            tolerance_minutes: default_tolerance_minutes(),
            poll_interval_secs: default_poll_interval_secs(),
            target_member_id: None,
        }
    }
}

/// Where alarms and intake logs live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The PillLink backend
    #[default]
    Remote,
    /// The offline SQLite store in the data directory
    Local,
}

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub reminders: ReminderSettings,
    #[serde(default)]
    pub calendar: MarkerOptions,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            api: ApiSettings::default(),
            reminders: ReminderSettings::default(),
            calendar: MarkerOptions::default(),
        }
    }
}

impl AppSettings {
    /// Check limits before the settings are used or saved
    pub fn validate(&self) -> Result<()> {
        if self.backend == Backend::Remote && self.api.base_url.trim().is_empty() {
            return Err(AppError::InvalidSettings(
                "api.base_url is required for the remote backend".to_string(),
            ));
        }

        if self.reminders.tolerance_minutes > MAX_TOLERANCE_MINUTES {
            return Err(AppError::InvalidSettings(format!(
                "reminders.tolerance_minutes must be at most {}",
                MAX_TOLERANCE_MINUTES
            )));
        }

        let interval = self.reminders.poll_interval_secs;
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&interval) {
            return Err(AppError::InvalidSettings(format!(
                "reminders.poll_interval_secs must be between {} and {}",
                MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS
            )));
        }

        Ok(())
    }
}

/// Service for managing client settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::InvalidSettings(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Get reminder settings
    pub async fn get_reminders(&self) -> Result<ReminderSettings> {
        Ok(self.load().await?.reminders)
    }

    /// Update reminder settings
    pub async fn update_reminders(&self, reminders: ReminderSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.reminders = reminders;
        self.save(&settings).await
    }

    /// Store the session token obtained at sign-in; `None` signs out
    pub async fn set_session_token(&self, token: Option<String>) -> Result<()> {
        let mut settings = self.load().await?;
        settings.api.session_token = token;
        self.save(&settings).await
    }
}
