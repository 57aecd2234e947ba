//! Backup archive reader
//!
//! Validates archives without side effects and restores their payload. Images
//! are written to the image store while the archive is scanned, so a restore
//! that fails afterwards can leave restored images behind.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{ExpireError, ExpireResult};
use crate::models::{validate_image_reference, Item};
use crate::storage::{ImageStore, ItemStore};

use super::format::{
    image_name_from_entry, BackupMetadata, FORMAT_VERSION, ITEMS_ENTRY, METADATA_ENTRY,
};

/// How restored items are combined with the current catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Clear the catalog before inserting the restored items
    #[default]
    Replace,
    /// Keep the catalog; restored items overwrite items with the same id
    Merge,
}

impl RestoreMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Some(Self::Replace),
            "merge" => Some(Self::Merge),
            _ => None,
        }
    }
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// Result of validating a backup without restoring it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupValidation {
    /// Metadata present, items present and non-empty
    pub is_valid: bool,
    pub has_metadata: bool,
    pub has_items: bool,
    pub item_count: usize,
    pub image_count: usize,
    /// Size of the archive in bytes
    pub archive_size: u64,
    /// Format version from the metadata, if it could be read
    pub format_version: Option<u32>,
}

impl BackupValidation {
    /// Whether this build can restore the archive
    pub fn is_restorable(&self) -> bool {
        self.is_valid && self.format_version.map_or(false, |v| v <= FORMAT_VERSION)
    }

    /// Get a summary of what the archive contains
    pub fn summary(&self) -> String {
        let mut missing = Vec::new();
        if !self.has_metadata {
            missing.push("metadata");
        }
        if !self.has_items {
            missing.push("items");
        }

        if missing.is_empty() {
            format!("{} items, {} images", self.item_count, self.image_count)
        } else {
            format!("Missing: {}", missing.join(", "))
        }
    }

    /// Why the archive cannot be restored, matching the reader's errors
    pub fn rejection_reason(&self) -> String {
        if !self.has_metadata {
            "missing metadata".into()
        } else if !self.has_items || self.item_count == 0 {
            "missing item data".into()
        } else {
            self.summary()
        }
    }
}

/// Everything read out of a backup archive
#[derive(Debug, Clone)]
pub struct RestoreBundle {
    pub metadata: BackupMetadata,
    /// Items exactly as stored, including ones that fail validation
    pub items: Vec<Item>,
    /// Names of the images written to the image store
    pub images_restored: Vec<String>,
    pub backup_created_at: DateTime<Utc>,
}

/// Outcome of applying restored items to an item store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    pub inserted: usize,
    /// Items dropped because they failed validation
    pub rejected: usize,
}

/// Reads backup archives, writing restored images to an [`ImageStore`]
pub struct RestoreManager<'a> {
    images: &'a dyn ImageStore,
}

impl<'a> RestoreManager<'a> {
    pub fn new(images: &'a dyn ImageStore) -> Self {
        Self { images }
    }

    /// Inspect an archive without writing anything
    pub fn validate_backup<R: Read + Seek>(&self, mut source: R) -> ExpireResult<BackupValidation> {
        let archive_size = source
            .seek(SeekFrom::End(0))
            .map_err(|e| ExpireError::Io(format!("Failed to measure backup archive: {}", e)))?;
        source
            .seek(SeekFrom::Start(0))
            .map_err(|e| ExpireError::Io(format!("Failed to rewind backup archive: {}", e)))?;

        let mut archive = ZipArchive::new(source)?;

        let mut has_metadata = false;
        let mut format_version = None;
        let mut has_items = false;
        let mut item_count = 0;
        let mut image_count = 0;

        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            let name = entry.name().to_string();

            if name == METADATA_ENTRY {
                has_metadata = true;
                // An unreadable metadata body only hides the version
                format_version = serde_json::from_reader::<_, BackupMetadata>(entry)
                    .ok()
                    .map(|m| m.version);
            } else if name == ITEMS_ENTRY {
                has_items = true;
                item_count = decode_items(entry)?.len();
            } else if image_name_from_entry(&name).is_some() && !entry.is_dir() {
                image_count += 1;
            }
        }

        let validation = BackupValidation {
            is_valid: has_metadata && has_items && item_count > 0,
            has_metadata,
            has_items,
            item_count,
            image_count,
            archive_size,
            format_version,
        };
        debug!(?validation, "validated backup archive");
        Ok(validation)
    }

    /// Read an archive, storing its images and returning its items
    ///
    /// Items are returned unfiltered; [`apply_restore`] drops invalid ones.
    pub fn restore_backup<R: Read + Seek>(&self, source: R) -> ExpireResult<RestoreBundle> {
        let mut archive = ZipArchive::new(source)?;

        let mut metadata = None;
        let mut items = None;
        let mut images_restored = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();

            if name == METADATA_ENTRY {
                let decoded: BackupMetadata = serde_json::from_reader(entry).map_err(|e| {
                    ExpireError::InvalidArchive(format!("unreadable metadata: {}", e))
                })?;
                metadata = Some(decoded);
            } else if name == ITEMS_ENTRY {
                items = Some(decode_items(entry)?);
            } else if let Some(image_name) = image_name_from_entry(&name) {
                if entry.is_dir() {
                    continue;
                }
                if let Err(e) = validate_image_reference(image_name) {
                    warn!(entry = %name, error = %e, "skipping image entry with unsafe name");
                    continue;
                }

                let mut bytes = Vec::new();
                if let Err(e) = entry.read_to_end(&mut bytes) {
                    warn!(entry = %name, error = %e, "failed to read image entry, skipped");
                    continue;
                }

                match self.images.store(image_name, &bytes) {
                    Ok(stored) => images_restored.push(stored),
                    Err(e) => warn!(entry = %name, error = %e, "failed to restore image, skipped"),
                }
            } else {
                debug!(entry = %name, "ignoring unknown archive entry");
            }
        }

        let metadata =
            metadata.ok_or_else(|| ExpireError::InvalidArchive("missing metadata".into()))?;
        let items = items
            .filter(|items| !items.is_empty())
            .ok_or_else(|| ExpireError::InvalidArchive("missing item data".into()))?;

        if !metadata.is_supported() {
            return Err(ExpireError::UnsupportedVersion {
                found: metadata.version,
                supported: FORMAT_VERSION,
            });
        }

        info!(
            items = items.len(),
            images = images_restored.len(),
            version = metadata.version,
            "read backup archive"
        );

        Ok(RestoreBundle {
            backup_created_at: metadata.created_at,
            metadata,
            items,
            images_restored,
        })
    }

    /// Validate the archive at `path`
    pub fn validate_backup_file(&self, path: &Path) -> ExpireResult<BackupValidation> {
        self.validate_backup(open_archive(path)?)
    }

    /// Restore from the archive at `path`
    pub fn restore_backup_file(&self, path: &Path) -> ExpireResult<RestoreBundle> {
        self.restore_backup(open_archive(path)?)
    }
}

/// Put restored items into `store`, dropping items that fail validation
pub fn apply_restore(
    store: &dyn ItemStore,
    items: Vec<Item>,
    mode: RestoreMode,
) -> ExpireResult<RestoreOutcome> {
    let total = items.len();
    let valid: Vec<Item> = items
        .into_iter()
        .filter(|item| match item.validate() {
            Ok(()) => true,
            Err(e) => {
                debug!(id = item.id, name = %item.name, error = %e, "dropping invalid item");
                false
            }
        })
        .collect();
    let rejected = total - valid.len();

    let inserted = match mode {
        RestoreMode::Replace => store.replace_all(valid)?,
        RestoreMode::Merge => store.insert_many(valid)?,
    };

    info!(inserted, rejected, %mode, "applied restored items");
    Ok(RestoreOutcome { inserted, rejected })
}

fn open_archive(path: &Path) -> ExpireResult<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        ExpireError::Io(format!(
            "Failed to open backup file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(BufReader::new(file))
}

fn decode_items<R: Read>(reader: R) -> ExpireResult<Vec<Item>> {
    serde_json::from_reader(reader)
        .map_err(|e| ExpireError::InvalidArchive(format!("unreadable item data: {}", e)))
}
