//! Audit logging for ksexpire
//!
//! Records item create/update/delete operations and backup/restore runs in
//! an append-only JSONL log.
//!
//! - `AuditEntry`: one log line (timestamp, operation, entity, before/after).
//! - `AuditLogger`: appends entries and reads them back.
//! - `generate_diff`: one-line summary of field changes between two item states.
//!
//! # Example
//!
//! ```rust,ignore
//! use ksexpire::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(EntityType::Item, "42", Some("Netflix".into()), &item))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
