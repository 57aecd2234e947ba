//! User settings for ksexpire
//!
//! Manages user preferences including currency display, reminder lead times
//! and the default restore mode.

use serde::{Deserialize, Serialize};

use super::paths::ExpirePaths;
use crate::backup::RestoreMode;
use crate::error::ExpireError;

/// Reminder lead times, in days before the expiry date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    /// Days before a subscription charge
    pub subscription_days: u32,
    /// First warranty reminder
    pub warranty_days_first: u32,
    /// Second warranty reminder
    pub warranty_days_second: u32,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            subscription_days: 1,
            warranty_days_first: 30,
            warranty_days_second: 7,
        }
    }
}

impl NotificationDefaults {
    /// Serialize into the free-form string stored on an item
    pub fn to_item_config(&self) -> String {
        serde_json::json!({
            "subscription_days": self.subscription_days,
            "warranty_days_1": self.warranty_days_first,
            "warranty_days_2": self.warranty_days_second,
        })
        .to_string()
    }
}

/// User settings for ksexpire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when printing prices
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Whether a restore clears existing items before inserting
    #[serde(default)]
    pub restore_mode: RestoreMode,

    /// Default reminder configuration for new items
    #[serde(default)]
    pub notifications: NotificationDefaults,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            restore_mode: RestoreMode::default(),
            notifications: NotificationDefaults::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &ExpirePaths) -> Result<Self, ExpireError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| ExpireError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| ExpireError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ExpirePaths) -> Result<(), ExpireError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ExpireError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ExpireError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
