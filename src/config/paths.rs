//! Path management for ksexpire
//!
//! Provides XDG-compliant path resolution for configuration, data, receipt
//! images and backups.
//!
//! ## Path Resolution Order
//!
//! 1. `KSEXPIRE_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/ksexpire` or `~/.config/ksexpire`
//! 3. Windows: `%APPDATA%\ksexpire`

use std::path::PathBuf;

use crate::error::ExpireError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "KSEXPIRE_DATA_DIR";

/// Manages all paths used by ksexpire
#[derive(Debug, Clone)]
pub struct ExpirePaths {
    /// Base directory for all ksexpire data
    base_dir: PathBuf,
}

impl ExpirePaths {
    /// Create a new ExpirePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, ExpireError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create ExpirePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/ksexpire/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/ksexpire/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the receipt image directory (~/.config/ksexpire/receipts/)
    pub fn receipts_dir(&self) -> PathBuf {
        self.base_dir.join("receipts")
    }

    /// Get the default backup directory (~/.config/ksexpire/backups/)
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to items.json
    pub fn items_file(&self) -> PathBuf {
        self.data_dir().join("items.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), ExpireError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ExpireError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| ExpireError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.receipts_dir()).map_err(|e| {
            ExpireError::Io(format!("Failed to create receipts directory: {}", e))
        })?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| ExpireError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, ExpireError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                ExpireError::Config("Could not determine HOME directory".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("ksexpire"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, ExpireError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| ExpireError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("ksexpire"))
}
