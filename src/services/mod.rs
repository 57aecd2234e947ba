//! Service layer for ksexpire
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, audit logging, and the backup workflow.

pub mod backup;
pub mod item;

pub use backup::{BackupInfo, BackupService, RestoreReport};
pub use item::{
    CatalogSummary, ItemFilter, ItemService, ItemUpdate, PurgeReport, DEFAULT_PURGE_AGE_DAYS,
};
