//! Backup service
//!
//! Connects the backup engine to the on-disk stores: writes archives of the
//! current catalog into the backup directory, lists them, and runs the
//! validate, restore and apply sequence with audit logging.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::Operation;
use crate::backup::{
    apply_restore, generate_backup_file_name, BackupManager, BackupMetadata, BackupSummary,
    BackupValidation, RestoreManager, RestoreMode, RestoreOutcome, BACKUP_EXTENSION,
    BACKUP_FILE_PREFIX, FORMAT_VERSION,
};
use crate::error::{ExpireError, ExpireResult};
use crate::storage::{ItemStore, Storage};

/// A backup archive found in the backup directory
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Result of a completed restore
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub metadata: BackupMetadata,
    pub images_restored: usize,
    pub outcome: RestoreOutcome,
    pub mode: RestoreMode,
    /// Archive of the catalog as it was before the restore, if one was written
    pub safety_backup: Option<PathBuf>,
}

/// Service for creating and restoring backups
pub struct BackupService<'a> {
    storage: &'a Storage,
}

impl<'a> BackupService<'a> {
    /// Create a new backup service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Back up the whole catalog
    ///
    /// `output` may name a file or an existing directory. Without it the
    /// archive goes to the backup directory under a generated name.
    pub fn create(&self, output: Option<&Path>) -> ExpireResult<(PathBuf, BackupSummary)> {
        let path = match output {
            Some(path) if path.is_dir() => unique_backup_path(path, Utc::now()),
            Some(path) => path.to_path_buf(),
            None => unique_backup_path(&self.storage.paths().backup_dir(), Utc::now()),
        };

        let items = self.storage.items.get_all_ordered()?;
        let summary = BackupManager::new(&self.storage.images).create_backup_file(&items, &path)?;

        self.storage.log_archive(
            Operation::Backup,
            &display_name(&path),
            &summary,
            format!(
                "{} items, {} images",
                summary.items_backed_up, summary.images_backed_up
            ),
        )?;
        info!(path = %path.display(), "backup created");

        Ok((path, summary))
    }

    /// Backup archives in the backup directory, newest first
    pub fn list(&self) -> ExpireResult<Vec<BackupInfo>> {
        let dir = self.storage.paths().backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&dir)
            .map_err(|e| ExpireError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| ExpireError::Io(format!("Failed to read directory entry: {}", e)))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !file_name.starts_with(BACKUP_FILE_PREFIX) || !file_name.ends_with(BACKUP_EXTENSION)
            {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            backups.push(BackupInfo {
                path: entry.path(),
                file_name,
                size_bytes: metadata.len(),
                modified,
            });
        }

        backups.sort_by(|a, b| {
            backup_order_key(&b.file_name)
                .cmp(&backup_order_key(&a.file_name))
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(backups)
    }

    /// Most recent archive in the backup directory
    pub fn latest(&self) -> ExpireResult<Option<BackupInfo>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Resolve `latest`, a path, or a file name in the backup directory
    pub fn resolve(&self, identifier: &str) -> ExpireResult<PathBuf> {
        if identifier.eq_ignore_ascii_case("latest") {
            return self.latest()?.map(|b| b.path).ok_or_else(|| ExpireError::NotFound {
                entity_type: "Backup",
                identifier: "latest".to_string(),
            });
        }

        let path = PathBuf::from(identifier);
        if path.is_file() {
            return Ok(path);
        }

        let backup_dir = self.storage.paths().backup_dir();
        let in_dir = backup_dir.join(identifier);
        if in_dir.is_file() {
            return Ok(in_dir);
        }

        let with_ext = backup_dir.join(format!("{}{}", identifier, BACKUP_EXTENSION));
        if with_ext.is_file() {
            return Ok(with_ext);
        }

        Err(ExpireError::NotFound {
            entity_type: "Backup",
            identifier: identifier.to_string(),
        })
    }

    /// Inspect an archive without changing anything
    pub fn validate(&self, path: &Path) -> ExpireResult<BackupValidation> {
        RestoreManager::new(&self.storage.images).validate_backup_file(path)
    }

    /// Validate, then restore an archive into the stores
    ///
    /// With `safety_backup` set and a non-empty catalog, the current catalog
    /// is archived first.
    pub fn restore(
        &self,
        path: &Path,
        mode: RestoreMode,
        safety_backup: bool,
    ) -> ExpireResult<RestoreReport> {
        let restore_manager = RestoreManager::new(&self.storage.images);

        let validation = restore_manager.validate_backup_file(path)?;
        if !validation.is_valid {
            return Err(ExpireError::InvalidArchive(validation.rejection_reason()));
        }
        if let Some(found) = validation.format_version.filter(|v| *v > FORMAT_VERSION) {
            return Err(ExpireError::UnsupportedVersion {
                found,
                supported: FORMAT_VERSION,
            });
        }

        let safety_backup = if safety_backup && self.storage.items.count()? > 0 {
            Some(self.create(None)?.0)
        } else {
            None
        };

        let bundle = restore_manager.restore_backup_file(path)?;
        let images_restored = bundle.images_restored.len();
        let outcome = apply_restore(&self.storage.items, bundle.items, mode)?;
        if outcome.rejected > 0 {
            warn!(rejected = outcome.rejected, "skipped invalid items from backup");
        }

        let report = RestoreReport {
            metadata: bundle.metadata,
            images_restored,
            outcome,
            mode,
            safety_backup,
        };

        self.storage.log_archive(
            Operation::Restore,
            &display_name(path),
            &report,
            format!(
                "{} items restored ({} skipped), {} images",
                outcome.inserted, outcome.rejected, images_restored
            ),
        )?;

        Ok(report)
    }
}

/// Generated backup path in `dir` that does not exist yet
fn unique_backup_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    let name = generate_backup_file_name(now);
    let mut path = dir.join(&name);

    let stem = name.trim_end_matches(BACKUP_EXTENSION);
    let mut attempt = 1;
    while path.exists() {
        attempt += 1;
        path = dir.join(format!("{}_{}{}", stem, attempt, BACKUP_EXTENSION));
    }
    path
}

/// Creation order of a generated backup name: timestamp, then collision suffix
fn backup_order_key(file_name: &str) -> (&str, u32) {
    let stem = file_name
        .strip_prefix(BACKUP_FILE_PREFIX)
        .and_then(|s| s.strip_suffix(BACKUP_EXTENSION))
        .unwrap_or(file_name);

    // The timestamp itself is "YYYYMMDD_HHMMSS"
    match stem.rsplit_once('_') {
        Some((stamp, suffix)) if stamp.contains('_') => match suffix.parse() {
            Ok(attempt) => (stamp, attempt),
            Err(_) => (stem, 1),
        },
        _ => (stem, 1),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
