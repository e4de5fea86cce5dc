//! Configuration service implementation.
//!
//! Loads [`ScrapegenConfig`] from `config.toml` and caches it. A missing file at
//! the default location is not an error; a missing file the caller named
//! explicitly is.

use crate::paths::ScrapegenPaths;
use scrapegen_core::config::ScrapegenConfig;
use scrapegen_core::{Result, ScrapegenError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file. `None` means the platform default location.
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ScrapegenConfig>>>,
}

impl ConfigService {
    /// Reads the platform default `config.toml`.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Reads the given file, which must exist.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ScrapegenConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load_config(&self) -> Result<ScrapegenConfig> {
        match &self.path {
            Some(path) => {
                if !path.exists() {
                    return Err(ScrapegenError::config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::read_file(path)
            }
            None => {
                let path = ScrapegenPaths::config_file()
                    .map_err(|e| ScrapegenError::config(e.to_string()))?;
                if path.exists() {
                    Self::read_file(&path)
                } else {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    Ok(ScrapegenConfig::default())
                }
            }
        }
    }

    fn read_file(path: &Path) -> Result<ScrapegenConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrapegenError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            ScrapegenError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
