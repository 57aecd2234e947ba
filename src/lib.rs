//! ksexpire - local-first subscription and warranty tracker
//!
//! This library provides the core functionality for the ksexpire tracker: an
//! item catalog of subscriptions and warranty receipts, stored as JSON with
//! receipt images alongside, and a backup engine that packs the whole catalog
//! into one versioned ZIP archive and restores it again.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (items, image references)
//! - `storage`: JSON item repository and receipt image directory
//! - `backup`: Backup archive writer, reader and restore application
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `cli`, `display`: Terminal front-end
//!
//! # Example
//!
//! ```rust,ignore
//! use ksexpire::config::{paths::ExpirePaths, settings::Settings};
//! use ksexpire::services::BackupService;
//! use ksexpire::storage::Storage;
//!
//! let paths = ExpirePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//!
//! let (path, summary) = BackupService::new(&storage).create(None)?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ExpireError, ExpireResult};
