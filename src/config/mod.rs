//! Configuration module for ksexpire
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::ExpirePaths;
pub use settings::Settings;
