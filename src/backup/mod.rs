//! Backup and restore of the item catalog
//!
//! A backup is a ZIP archive holding the catalog as JSON plus the receipt
//! images it references.
//!
//! - `BackupManager`: writes archives
//! - `RestoreManager`: validates and reads archives
//! - `apply_restore`: puts restored items back into an item store
//!
//! # Example
//!
//! ```rust,ignore
//! use ksexpire::backup::{apply_restore, BackupManager, RestoreManager, RestoreMode};
//!
//! let summary = BackupManager::new(&storage.images)
//!     .create_backup_file(&storage.items.get_all()?, &path)?;
//!
//! let bundle = RestoreManager::new(&storage.images).restore_backup_file(&path)?;
//! let outcome = apply_restore(&storage.items, bundle.items, RestoreMode::Replace)?;
//! ```

mod format;
mod manager;
mod restore;

pub use format::{
    generate_backup_file_name, BackupMetadata, BACKUP_EXTENSION, BACKUP_FILE_PREFIX,
    FORMAT_VERSION,
};
pub use manager::{BackupManager, BackupSummary};
pub use restore::{
    apply_restore, BackupValidation, RestoreBundle, RestoreManager, RestoreMode, RestoreOutcome,
};
