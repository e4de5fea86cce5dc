//! Directory-backed [`ScriptPublisher`].
//!
//! ```text
//! scrapers_dir/
//! ├── <scraper-id>.ts      # the validated script
//! └── <scraper-id>.json    # ScriptMetadata
//! ```

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use chrono::Utc;
use scrapegen_core::contract::ScriptMetadata;
use scrapegen_core::publish::ScriptPublisher;
use scrapegen_core::session::Session;
use scrapegen_core::{Result, ScrapegenError};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct DirScriptPublisher {
    scrapers_dir: PathBuf,
}

impl DirScriptPublisher {
    pub fn new(scrapers_dir: impl Into<PathBuf>) -> Self {
        Self {
            scrapers_dir: scrapers_dir.into(),
        }
    }

    pub fn scrapers_dir(&self) -> &Path {
        &self.scrapers_dir
    }

    pub fn script_path(&self, scraper_id: &str) -> PathBuf {
        self.scrapers_dir.join(format!("{scraper_id}.ts"))
    }

    pub fn metadata_path(&self, scraper_id: &str) -> PathBuf {
        self.scrapers_dir.join(format!("{scraper_id}.json"))
    }
}

#[async_trait]
impl ScriptPublisher for DirScriptPublisher {
    async fn publish(&self, session: &Session, script: &str) -> Result<String> {
        let scraper_id = uuid::Uuid::new_v4().to_string();

        fs::create_dir_all(&self.scrapers_dir).await.map_err(|e| {
            ScrapegenError::persistence(format!(
                "Failed to create scrapers directory {}: {}",
                self.scrapers_dir.display(),
                e
            ))
        })?;

        let script_path = self.script_path(&scraper_id);
        fs::write(&script_path, script).await.map_err(|e| {
            ScrapegenError::persistence(format!(
                "Failed to write {}: {}",
                script_path.display(),
                e
            ))
        })?;

        AtomicJsonFile::new(self.metadata_path(&scraper_id))
            .save(&ScriptMetadata::for_session(session, Utc::now()))
            .await?;

        tracing::info!(
            session_id = %session.id,
            scraper_id = %scraper_id,
            path = %script_path.display(),
            "Published scraper script"
        );
        Ok(scraper_id)
    }
}
