//! Storage layer for ksexpire
//!
//! Provides the JSON item repository, the receipt image directory and the
//! audit log, all rooted in one [`ExpirePaths`] tree.

pub mod file_io;
pub mod images;
pub mod items;

pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use images::{FileImageStore, ImageStore};
pub use items::{ItemRepository, ItemStore};

use serde::Serialize;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType, Operation};
use crate::config::paths::ExpirePaths;
use crate::error::ExpireError;
use crate::models::Item;

/// Main storage coordinator that provides access to items, images and the audit log
pub struct Storage {
    paths: ExpirePaths,
    pub items: ItemRepository,
    pub images: FileImageStore,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: ExpirePaths) -> Result<Self, ExpireError> {
        paths.ensure_directories()?;

        Ok(Self {
            items: ItemRepository::new(paths.items_file()),
            images: FileImageStore::new(paths.receipts_dir()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &ExpirePaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), ExpireError> {
        self.items.load()
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), ExpireError> {
        self.items.save()
    }

    pub fn log_item_create(&self, item: &Item) -> Result<(), ExpireError> {
        self.audit.log(&AuditEntry::create(
            EntityType::Item,
            item.id.to_string(),
            Some(item.name.clone()),
            item,
        ))
    }

    pub fn log_item_update(&self, before: &Item, after: &Item) -> Result<(), ExpireError> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        self.audit.log(&AuditEntry::update(
            EntityType::Item,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
            diff,
        ))
    }

    pub fn log_item_delete(&self, item: &Item) -> Result<(), ExpireError> {
        self.audit.log(&AuditEntry::delete(
            EntityType::Item,
            item.id.to_string(),
            Some(item.name.clone()),
            item,
        ))
    }

    /// Record a backup or restore run
    pub fn log_archive<T: Serialize>(
        &self,
        operation: Operation,
        archive_name: &str,
        details: &T,
        summary: String,
    ) -> Result<(), ExpireError> {
        self.audit.log(&AuditEntry::archive(
            operation,
            archive_name,
            details,
            Some(summary),
        ))
    }
}
