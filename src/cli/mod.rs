//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod item;

pub use backup::{handle_backup_command, BackupCommands};
pub use item::{handle_item_command, ItemCommands};
