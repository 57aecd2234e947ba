//! Archive layout shared by the writer and the reader
//!
//! A backup is a ZIP file holding `backup_metadata.json`, `items.json` and
//! one `images/<reference>` entry per receipt image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newest archive format this build writes and reads
pub const FORMAT_VERSION: u32 = 1;

/// Metadata entry name
pub const METADATA_ENTRY: &str = "backup_metadata.json";

/// Items entry name
pub const ITEMS_ENTRY: &str = "items.json";

/// Folder prefix for image entries
pub const IMAGES_PREFIX: &str = "images/";

/// Producer version recorded when none is configured
pub const FALLBACK_PRODUCER_VERSION: &str = "1.0.0";

/// File name prefix of generated backup archives
pub const BACKUP_FILE_PREFIX: &str = "ks_expire_backup_";

/// File extension of backup archives
pub const BACKUP_EXTENSION: &str = ".zip";

/// Contents of `backup_metadata.json`
///
/// The counts are informational. Readers recompute them from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    /// Archive format version
    pub version: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Version of the program that wrote the archive
    pub app_version: String,
    pub items_count: usize,
    /// Items with an image reference at backup time
    pub images_count: usize,
}

impl BackupMetadata {
    /// Whether this build can restore the archive
    pub fn is_supported(&self) -> bool {
        self.version <= FORMAT_VERSION
    }
}

/// Entry name for an image reference
pub fn image_entry_name(reference: &str) -> String {
    format!("{}{}", IMAGES_PREFIX, reference)
}

/// Trailing image name of an `images/` entry, if `entry_name` is one
pub fn image_name_from_entry(entry_name: &str) -> Option<&str> {
    entry_name
        .strip_prefix(IMAGES_PREFIX)
        .filter(|name| !name.is_empty() && !name.ends_with('/'))
}

/// Default file name for a backup written at `now`
pub fn generate_backup_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{}{}{}",
        BACKUP_FILE_PREFIX,
        now.format("%Y%m%d_%H%M%S"),
        BACKUP_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wire_format() {
        let metadata = BackupMetadata {
            version: 1,
            created_at: DateTime::from_timestamp_millis(1_734_100_222_000).unwrap(),
            app_version: "0.1.0".into(),
            items_count: 3,
            images_count: 2,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["createdAt"], 1_734_100_222_000_i64);
        assert_eq!(value["appVersion"], "0.1.0");
        assert_eq!(value["itemsCount"], 3);
        assert_eq!(value["imagesCount"], 2);
    }

    #[test]
    fn test_version_support() {
        let mut metadata: BackupMetadata = serde_json::from_str(
            r#"{"version":1,"createdAt":0,"appVersion":"1.0.0","itemsCount":0,"imagesCount":0}"#,
        )
        .unwrap();
        assert!(metadata.is_supported());

        metadata.version = FORMAT_VERSION + 1;
        assert!(!metadata.is_supported());
    }

    #[test]
    fn test_image_entry_names() {
        assert_eq!(image_entry_name("img_1.jpg"), "images/img_1.jpg");
        assert_eq!(image_name_from_entry("images/img_1.jpg"), Some("img_1.jpg"));
        assert_eq!(
            image_name_from_entry("images/../../etc/passwd"),
            Some("../../etc/passwd")
        );
        assert_eq!(image_name_from_entry("images/"), None);
        assert_eq!(image_name_from_entry("images/sub/"), None);
        assert_eq!(image_name_from_entry("items.json"), None);
    }

    #[test]
    fn test_generate_backup_file_name() {
        let now = DateTime::from_timestamp(1_734_100_222, 0).unwrap();
        assert_eq!(
            generate_backup_file_name(now),
            "ks_expire_backup_20241213_143022.zip"
        );
    }
}
