//! Receipt image storage
//!
//! Images live as plain files in a single directory and are addressed by
//! their file name (the item's image reference). The backup engine only sees
//! the [`ImageStore`] trait.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ExpireError, ExpireResult};
use crate::models::validate_image_reference;

use super::file_io::write_bytes_atomic;

/// Prefix of generated image file names
pub const IMAGE_FILE_PREFIX: &str = "img_";

/// Extension used when the source file has none
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Byte-level access to receipt images
pub trait ImageStore {
    /// Bytes of the referenced image, or `None` if it does not exist
    fn resolve(&self, reference: &str) -> ExpireResult<Option<Vec<u8>>>;

    /// Store `bytes` under `name`, returning the reference to record on the item
    fn store(&self, name: &str, bytes: &[u8]) -> ExpireResult<String>;
}

/// Directory-backed image store
#[derive(Debug, Clone)]
pub struct FileImageStore {
    dir: PathBuf,
}

impl FileImageStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a reference, refusing anything that is not a plain file name
    pub fn path_for(&self, reference: &str) -> ExpireResult<PathBuf> {
        validate_image_reference(reference).map_err(|e| ExpireError::Validation(e.to_string()))?;
        Ok(self.dir.join(reference))
    }

    pub fn exists(&self, reference: &str) -> bool {
        self.path_for(reference)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Copy an image file into the store under a generated name
    pub fn import_file(&self, source: &Path) -> ExpireResult<String> {
        let bytes = fs::read(source).map_err(|e| {
            ExpireError::Io(format!("Failed to read image {}: {}", source.display(), e))
        })?;

        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(DEFAULT_IMAGE_EXTENSION)
            .to_lowercase();

        let now = Utc::now();
        let mut name = generate_image_file_name(now, &extension);
        let mut attempt = 1;
        while self.exists(&name) {
            attempt += 1;
            name = format!("{}_{}.{}", image_stem(now), attempt, extension);
        }

        self.store(&name, &bytes)
    }

    /// Remove an image; returns whether a file was deleted
    pub fn delete(&self, reference: &str) -> ExpireResult<bool> {
        let path = self.path_for(reference)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ExpireError::Io(format!(
                "Failed to delete image {}: {}",
                reference, e
            ))),
        }
    }

    /// Total bytes used by stored images
    pub fn total_size(&self) -> ExpireResult<u64> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut total = 0;
        for entry in fs::read_dir(&self.dir)
            .map_err(|e| ExpireError::Io(format!("Failed to read image directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| ExpireError::Io(format!("Failed to read directory entry: {}", e)))?;
            if let Ok(meta) = entry.metadata() {
                if meta.is_file() {
                    total += meta.len();
                }
            }
        }
        Ok(total)
    }
}

impl ImageStore for FileImageStore {
    fn resolve(&self, reference: &str) -> ExpireResult<Option<Vec<u8>>> {
        let path = self.path_for(reference)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ExpireError::Io(format!(
                "Failed to read image {}: {}",
                reference, e
            ))),
        }
    }

    fn store(&self, name: &str, bytes: &[u8]) -> ExpireResult<String> {
        let path = self.path_for(name)?;
        write_bytes_atomic(&path, bytes)?;
        debug!(image = name, bytes = bytes.len(), "stored image");
        Ok(name.to_string())
    }
}

/// Name for a newly captured image: `img_YYYYMMDD_HHMMSS.<ext>`
pub fn generate_image_file_name(now: DateTime<Utc>, extension: &str) -> String {
    format!("{}.{}", image_stem(now), extension)
}

fn image_stem(now: DateTime<Utc>) -> String {
    format!("{}{}", IMAGE_FILE_PREFIX, now.format("%Y%m%d_%H%M%S"))
}
