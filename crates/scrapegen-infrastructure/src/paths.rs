//! Unified path management for scrapegen files.
//!
//! Directory structure:
//!
//! ```text
//! ~/.config/scrapegen/          # Config directory
//! └── config.toml               # Application configuration
//!
//! ~/.local/share/scrapegen/     # Data directory
//! ├── sessions/                 # One JSON document per session
//! └── scrapers/                 # Published scripts and their metadata
//! ```

use scrapegen_core::config::StorageSettings;
use std::path::PathBuf;

const APP_DIR: &str = "scrapegen";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct ScrapegenPaths;

impl ScrapegenPaths {
    /// Platform config directory with `scrapegen` appended.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Platform data directory with `scrapegen` appended.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("sessions"))
    }

    pub fn scrapers_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("scrapers"))
    }

    /// Sessions directory from `[storage]`, falling back to [`Self::sessions_dir`].
    pub fn resolve_sessions_dir(storage: &StorageSettings) -> Result<PathBuf, PathError> {
        match &storage.sessions_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::sessions_dir(),
        }
    }

    /// Scrapers directory from `[storage]`, falling back to [`Self::scrapers_dir`].
    pub fn resolve_scrapers_dir(storage: &StorageSettings) -> Result<PathBuf, PathError> {
        match &storage.scrapers_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::scrapers_dir(),
        }
    }
}
