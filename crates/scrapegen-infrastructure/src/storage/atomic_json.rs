//! Atomic JSON file operations.
//!
//! Writes go to a temporary sibling file that is synced and then renamed over
//! the target, so readers never observe a partially written document.

use scrapegen_core::{Result, ScrapegenError};
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A handle to one JSON document on disk.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> Result<bool> {
        fs::try_exists(&self.path)
            .await
            .map_err(|e| self.persistence_error("check", e))
    }

    /// Loads and deserializes the document.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist
    /// - `Err`: Failed to read or parse the file
    pub async fn load(&self) -> Result<Option<T>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.persistence_error("read", e)),
        };

        serde_json::from_slice(&content).map(Some).map_err(|e| {
            ScrapegenError::persistence(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Saves data atomically via a temporary file and rename.
    pub async fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.persistence_error("create directory for", e))?;
        }

        let json = serde_json::to_vec_pretty(data)?;

        let tmp_path = self.temp_path();
        let mut tmp_file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| self.persistence_error("create temporary file for", e))?;
        tmp_file
            .write_all(&json)
            .await
            .map_err(|e| self.persistence_error("write", e))?;
        // Ensure data is written to disk
        tmp_file
            .sync_all()
            .await
            .map_err(|e| self.persistence_error("sync", e))?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.persistence_error("replace", e));
        }
        Ok(())
    }

    /// Removes the document. Returns `false` if it did not exist.
    pub async fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.persistence_error("remove", e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }

    fn persistence_error(&self, action: &str, err: std::io::Error) -> ScrapegenError {
        ScrapegenError::persistence(format!(
            "Failed to {} {}: {}",
            action,
            self.path.display(),
            err
        ))
    }
}
