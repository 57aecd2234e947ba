//! Backup archive writer
//!
//! Packs the item catalog and its receipt images into a single ZIP archive.
//! The two mandatory entries must be written; images are best effort.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ExpireError, ExpireResult};
use crate::models::{now_millis, validate_image_reference, Item};
use crate::storage::ImageStore;

use super::format::{
    image_entry_name, BackupMetadata, FALLBACK_PRODUCER_VERSION, FORMAT_VERSION, ITEMS_ENTRY,
    METADATA_ENTRY,
};

/// Outcome of writing one archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    pub items_backed_up: usize,
    pub images_backed_up: usize,
    /// Size of the finished archive in bytes
    pub archive_size: u64,
}

/// Writes backup archives, reading receipt images from an [`ImageStore`]
pub struct BackupManager<'a> {
    images: &'a dyn ImageStore,
    producer_version: String,
}

impl<'a> BackupManager<'a> {
    /// Create a manager that records this crate's version as the producer
    pub fn new(images: &'a dyn ImageStore) -> Self {
        Self {
            images,
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the producer version written into the metadata
    pub fn with_producer_version(mut self, version: impl Into<String>) -> Self {
        self.producer_version = version.into();
        self
    }

    fn producer_version(&self) -> &str {
        let version = self.producer_version.trim();
        if version.is_empty() {
            FALLBACK_PRODUCER_VERSION
        } else {
            version
        }
    }

    /// Write `items` and their images to `sink` as a backup archive
    ///
    /// Items are written in the given order. An image that cannot be
    /// resolved is skipped and only lowers `images_backed_up`.
    pub fn create_backup<W: Write + Seek>(
        &self,
        items: &[Item],
        sink: W,
    ) -> ExpireResult<BackupSummary> {
        let metadata = BackupMetadata {
            version: FORMAT_VERSION,
            created_at: now_millis(),
            app_version: self.producer_version().to_string(),
            items_count: items.len(),
            images_count: items.iter().filter(|i| i.image().is_some()).count(),
        };

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(sink);

        write_json_entry(&mut zip, METADATA_ENTRY, &metadata, options)?;
        write_json_entry(&mut zip, ITEMS_ENTRY, items, options)?;

        let mut written = HashSet::new();
        for reference in items.iter().filter_map(Item::image) {
            if written.contains(reference) {
                continue;
            }
            if self.add_image(&mut zip, reference, options) {
                written.insert(reference);
            }
        }

        let mut sink = zip
            .finish()
            .map_err(|e| ExpireError::Io(format!("Failed to finish backup archive: {}", e)))?;
        sink.flush()
            .map_err(|e| ExpireError::Io(format!("Failed to flush backup archive: {}", e)))?;
        let archive_size = sink
            .seek(SeekFrom::End(0))
            .map_err(|e| ExpireError::Io(format!("Failed to measure backup archive: {}", e)))?;

        let summary = BackupSummary {
            items_backed_up: items.len(),
            images_backed_up: written.len(),
            archive_size,
        };
        info!(
            items = summary.items_backed_up,
            images = summary.images_backed_up,
            bytes = summary.archive_size,
            "backup archive written"
        );
        Ok(summary)
    }

    /// Write a backup archive to a new file at `path`
    ///
    /// Fails if the file already exists.
    pub fn create_backup_file(&self, items: &[Item], path: &Path) -> ExpireResult<BackupSummary> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ExpireError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                ExpireError::Io(format!(
                    "Failed to open backup file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        self.create_backup(items, BufWriter::new(file))
    }

    /// Append one image entry; returns whether it made it into the archive
    fn add_image<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        reference: &str,
        options: SimpleFileOptions,
    ) -> bool {
        if let Err(e) = validate_image_reference(reference) {
            warn!(image = reference, error = %e, "skipping image with unsafe reference");
            return false;
        }

        let bytes = match self.images.resolve(reference) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(image = reference, "image missing from store, skipped");
                return false;
            }
            Err(e) => {
                warn!(image = reference, error = %e, "failed to read image, skipped");
                return false;
            }
        };

        let added = zip
            .start_file(image_entry_name(reference), options)
            .map_err(ExpireError::from)
            .and_then(|_| zip.write_all(&bytes).map_err(ExpireError::from));

        match added {
            Ok(()) => true,
            Err(e) => {
                warn!(image = reference, error = %e, "failed to add image, skipped");
                let _ = zip.abort_file();
                false
            }
        }
    }
}

fn write_json_entry<W: Write + Seek, T: Serialize + ?Sized>(
    zip: &mut ZipWriter<W>,
    name: &str,
    value: &T,
    options: SimpleFileOptions,
) -> ExpireResult<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| ExpireError::Json(format!("Failed to serialize {}: {}", name, e)))?;

    zip.start_file(name, options)
        .map_err(|e| ExpireError::Io(format!("Failed to start {}: {}", name, e)))?;
    zip.write_all(&json)
        .map_err(|e| ExpireError::Io(format!("Failed to write {}: {}", name, e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::format::IMAGES_PREFIX;
    use crate::storage::FileImageStore;
    use chrono::{DateTime, Duration};
    use std::io::{Cursor, Read};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn create_test_images() -> (TempDir, FileImageStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileImageStore::new(temp_dir.path().join("receipts"));
        (temp_dir, store)
    }

    fn item(id: i64, name: &str, image: Option<&str>) -> Item {
        let purchase = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let mut item = Item::warranty(name, purchase, purchase + Duration::days(365), None);
        item.id = id;
        item.image_reference = image.map(String::from);
        item
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(String::from).collect()
    }

    #[test]
    fn test_entry_order_and_contents() {
        let (_temp, images) = create_test_images();
        images.store("a.jpg", b"aaa").unwrap();
        let items = vec![item(1, "TV", Some("a.jpg")), item(2, "Fridge", None)];

        let mut sink = Cursor::new(Vec::new());
        let summary = BackupManager::new(&images)
            .create_backup(&items, &mut sink)
            .unwrap();

        assert_eq!(summary.items_backed_up, 2);
        assert_eq!(summary.images_backed_up, 1);
        assert_eq!(summary.archive_size, sink.get_ref().len() as u64);

        let mut archive = ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), METADATA_ENTRY);
        assert_eq!(archive.by_index(1).unwrap().name(), ITEMS_ENTRY);

        let mut image = Vec::new();
        archive
            .by_name(&format!("{}a.jpg", IMAGES_PREFIX))
            .unwrap()
            .read_to_end(&mut image)
            .unwrap();
        assert_eq!(image, b"aaa");
    }

    #[test]
    fn test_metadata_counts() {
        let (_temp, images) = create_test_images();
        let items = vec![
            item(1, "A", Some("missing.jpg")),
            item(2, "B", Some("  ")),
            item(3, "C", None),
        ];

        let mut sink = Cursor::new(Vec::new());
        BackupManager::new(&images)
            .with_producer_version("2.3.4")
            .create_backup(&items, &mut sink)
            .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        let mut json = String::new();
        archive
            .by_name(METADATA_ENTRY)
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();
        let metadata: BackupMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(metadata.version, FORMAT_VERSION);
        assert_eq!(metadata.app_version, "2.3.4");
        assert_eq!(metadata.items_count, 3);
        assert_eq!(metadata.images_count, 1);
    }

    #[test]
    fn test_blank_producer_version_falls_back() {
        let (_temp, images) = create_test_images();
        let manager = BackupManager::new(&images).with_producer_version("  ");
        assert_eq!(manager.producer_version(), FALLBACK_PRODUCER_VERSION);
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let (_temp, images) = create_test_images();
        images.store("present.jpg", b"p").unwrap();
        let items = vec![
            item(1, "A", Some("present.jpg")),
            item(2, "B", Some("absent.jpg")),
        ];

        let mut sink = Cursor::new(Vec::new());
        let summary = BackupManager::new(&images)
            .create_backup(&items, &mut sink)
            .unwrap();

        assert_eq!(summary.items_backed_up, 2);
        assert_eq!(summary.images_backed_up, 1);
        assert!(!entry_names(sink.get_ref()).contains(&"images/absent.jpg".to_string()));
    }

    #[test]
    fn test_unsafe_reference_never_written() {
        let (_temp, images) = create_test_images();
        let items = vec![item(1, "A", Some("../../etc/passwd"))];

        let mut sink = Cursor::new(Vec::new());
        let summary = BackupManager::new(&images)
            .create_backup(&items, &mut sink)
            .unwrap();

        assert_eq!(summary.images_backed_up, 0);
        assert_eq!(entry_names(sink.get_ref()).len(), 2);
    }

    #[test]
    fn test_shared_image_written_once() {
        let (_temp, images) = create_test_images();
        images.store("shared.jpg", b"s").unwrap();
        let items = vec![
            item(1, "A", Some("shared.jpg")),
            item(2, "B", Some("shared.jpg")),
        ];

        let mut sink = Cursor::new(Vec::new());
        let summary = BackupManager::new(&images)
            .create_backup(&items, &mut sink)
            .unwrap();

        assert_eq!(summary.images_backed_up, 1);
        assert_eq!(entry_names(sink.get_ref()).len(), 3);
    }

    #[test]
    fn test_empty_catalog() {
        let (_temp, images) = create_test_images();

        let mut sink = Cursor::new(Vec::new());
        let summary = BackupManager::new(&images)
            .create_backup(&[], &mut sink)
            .unwrap();

        assert_eq!(summary.items_backed_up, 0);
        assert_eq!(summary.images_backed_up, 0);
        assert_eq!(entry_names(sink.get_ref()), vec![METADATA_ENTRY, ITEMS_ENTRY]);
    }

    #[test]
    fn test_create_backup_file() {
        let (temp, images) = create_test_images();
        let path = temp.path().join("out").join("backup.zip");

        let summary = BackupManager::new(&images)
            .create_backup_file(&[item(1, "A", None)], &path)
            .unwrap();

        assert!(path.exists());
        assert_eq!(summary.archive_size, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_create_backup_file_refuses_existing() {
        let (temp, images) = create_test_images();
        let path = temp.path().join("backup.zip");
        fs::write(&path, b"keep me").unwrap();

        let result = BackupManager::new(&images).create_backup_file(&[], &path);
        assert!(matches!(result, Err(ExpireError::Io(_))));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");
    }
}
