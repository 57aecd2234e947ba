//! Display formatting for terminal output
//!
//! Provides utilities for formatting items and backup results as plain-text
//! tables and detail views.

pub mod backup;
pub mod item;

pub use backup::{
    format_backup_list, format_backup_summary, format_restore_report, format_size,
    format_validation,
};
pub use item::{
    format_catalog_summary, format_item_details, format_item_list, format_purge_report,
    status_label,
};
