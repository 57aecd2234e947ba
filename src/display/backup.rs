//! Backup display formatting

use chrono::{DateTime, Utc};

use crate::backup::{BackupSummary, BackupValidation, FORMAT_VERSION};
use crate::services::{BackupInfo, RestoreReport};

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration in human-readable form
pub fn format_age(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();

    if total_seconds < 60 {
        return format!("{}s", total_seconds.max(0));
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

pub fn format_backup_summary(summary: &BackupSummary) -> String {
    format!(
        "  Items:  {}\n  Images: {}\n  Size:   {}\n",
        summary.items_backed_up,
        summary.images_backed_up,
        format_size(summary.archive_size)
    )
}

/// Format the result of validating an archive
pub fn format_validation(validation: &BackupValidation) -> String {
    let mut output = String::new();
    output.push_str(&format!("  Size:     {}\n", format_size(validation.archive_size)));
    output.push_str(&format!(
        "  Version:  {}\n",
        validation
            .format_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    ));
    output.push_str(&format!("  Metadata: {}\n", yes_no(validation.has_metadata)));
    output.push_str(&format!(
        "  Items:    {} ({})\n",
        yes_no(validation.has_items),
        validation.item_count
    ));
    output.push_str(&format!("  Images:   {}\n", validation.image_count));
    output.push('\n');

    let status = if validation.is_restorable() {
        "Valid".to_string()
    } else if validation.is_valid {
        format!(
            "Unsupported (format version newer than {})",
            FORMAT_VERSION
        )
    } else {
        format!("Invalid ({})", validation.rejection_reason())
    };
    output.push_str(&format!("Status: {}\n", status));
    output
}

/// Format the archives in the backup directory
pub fn format_backup_list(backups: &[BackupInfo], now: DateTime<Utc>) -> String {
    if backups.is_empty() {
        return "No backups found.\nCreate one with: ksexpire backup create\n".to_string();
    }

    let mut output = String::new();
    for (i, backup) in backups.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} ({} ago, {})\n",
            i + 1,
            backup.file_name,
            format_age(now.signed_duration_since(backup.modified)),
            format_size(backup.size_bytes),
        ));
    }
    output.push('\n');
    output.push_str(&format!("Total: {} backup(s)\n", backups.len()));
    output
}

/// Format the result of a restore
pub fn format_restore_report(report: &RestoreReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "  Backup from:    {}\n",
        report.metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("  Written by:     {}\n", report.metadata.app_version));
    output.push_str(&format!("  Mode:           {}\n", report.mode));
    output.push_str(&format!("  Items restored: {}\n", report.outcome.inserted));
    if report.outcome.rejected > 0 {
        output.push_str(&format!(
            "  Items skipped:  {} (failed validation)\n",
            report.outcome.rejected
        ));
    }
    output.push_str(&format!("  Images:         {}\n", report.images_restored));
    if let Some(path) = &report.safety_backup {
        output.push_str(&format!("  Previous data:  {}\n", path.display()));
    }
    output
}
