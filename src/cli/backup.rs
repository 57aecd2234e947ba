//! Backup CLI commands
//!
//! Implements CLI commands for creating, inspecting and restoring backup
//! archives.

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;

use crate::backup::RestoreMode;
use crate::config::settings::Settings;
use crate::display::{
    format_backup_list, format_backup_summary, format_restore_report, format_validation,
};
use crate::error::ExpireResult;
use crate::services::BackupService;
use crate::storage::Storage;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write a backup of all items and receipt images
    Create {
        /// Output file or directory (defaults to the backup directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List backups in the backup directory
    List,

    /// Check a backup without restoring it
    Validate {
        /// Backup file, file name in the backup directory, or 'latest'
        backup: String,
    },

    /// Restore items and receipt images from a backup
    Restore {
        /// Backup file, file name in the backup directory, or 'latest'
        backup: String,

        /// Keep current items instead of replacing them
        #[arg(short, long)]
        merge: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BackupCommands,
) -> ExpireResult<()> {
    let service = BackupService::new(storage);

    match cmd {
        BackupCommands::Create { output } => {
            println!("Creating backup...");
            let (path, summary) = service.create(output.as_deref())?;
            println!("Backup created: {}", path.display());
            print!("{}", format_backup_summary(&summary));
        }

        BackupCommands::List => {
            let backups = service.list()?;
            if !backups.is_empty() {
                println!("Available Backups");
                println!("=================");
                println!();
            }
            print!("{}", format_backup_list(&backups, Utc::now()));
        }

        BackupCommands::Validate { backup } => {
            let path = service.resolve(&backup)?;
            let validation = service.validate(&path)?;

            println!("Backup: {}", path.display());
            print!("{}", format_validation(&validation));
        }

        BackupCommands::Restore {
            backup,
            merge,
            force,
        } => {
            let path = service.resolve(&backup)?;
            let mode = if merge {
                RestoreMode::Merge
            } else {
                settings.restore_mode
            };

            let validation = service.validate(&path)?;
            println!("Backup: {}", path.display());
            print!("{}", format_validation(&validation));
            println!();

            if !validation.is_restorable() {
                println!("This backup cannot be restored.");
                return Ok(());
            }

            if !force {
                match mode {
                    RestoreMode::Replace => {
                        println!("WARNING: This will replace ALL current items!")
                    }
                    RestoreMode::Merge => {
                        println!("Items from the backup will be merged into current items.")
                    }
                }
                println!("To proceed, run again with --force flag:");
                println!(
                    "  ksexpire backup restore {}{} --force",
                    backup,
                    if merge { " --merge" } else { "" }
                );
                return Ok(());
            }

            println!("Restoring from backup...");
            let report = service.restore(&path, mode, mode == RestoreMode::Replace)?;
            println!("Restore complete!");
            print!("{}", format_restore_report(&report));
        }
    }

    Ok(())
}
