//! Directory-backed SessionRepository implementation.
//!
//! Directory structure:
//! ```text
//! sessions_dir/
//! ├── <session-id-1>.json
//! └── <session-id-2>.json
//! ```

use crate::dto::SessionRecord;
use crate::paths::ScrapegenPaths;
use crate::repository::sort_newest_first;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use scrapegen_core::session::{Session, SessionRepository};
use scrapegen_core::{Result, ScrapegenError};
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

pub struct JsonDirSessionRepository {
    sessions_dir: PathBuf,
}

impl JsonDirSessionRepository {
    /// Creates a repository at the default location (`<data dir>/scrapegen/sessions`).
    pub async fn default_location() -> Result<Self> {
        let dir = ScrapegenPaths::sessions_dir().map_err(|e| {
            ScrapegenError::config(format!("Failed to get sessions directory: {}", e))
        })?;
        Self::new(dir).await
    }

    /// Creates a repository rooted at `sessions_dir`, creating it if needed.
    pub async fn new(sessions_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir).await.map_err(|e| {
            ScrapegenError::persistence(format!(
                "Failed to create sessions directory {}: {}",
                sessions_dir.display(),
                e
            ))
        })?;
        Ok(Self { sessions_dir })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn file(&self, session_id: &str) -> Result<AtomicJsonFile<SessionRecord>> {
        let valid = !session_id.is_empty()
            && !session_id.starts_with('.')
            && !session_id.contains(['/', '\\']);
        if !valid {
            return Err(ScrapegenError::persistence(format!(
                "Invalid session id '{}'",
                session_id
            )));
        }
        Ok(AtomicJsonFile::new(
            self.sessions_dir.join(format!("{session_id}.{EXTENSION}")),
        ))
    }

    async fn load_all(&self) -> Result<Vec<SessionRecord>> {
        let mut entries = fs::read_dir(&self.sessions_dir).await.map_err(|e| {
            ScrapegenError::persistence(format!(
                "Failed to read sessions directory {}: {}",
                self.sessions_dir.display(),
                e
            ))
        })?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScrapegenError::persistence(e.to_string()))?
        {
            let path = entry.path();
            let is_document = path.extension().is_some_and(|ext| ext == EXTENSION)
                && !path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with('.'));
            if !is_document {
                continue;
            }
            match AtomicJsonFile::<SessionRecord>::new(path.clone()).load().await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable session document"
                    );
                }
            }
        }
        Ok(records)
    }

    async fn list_where(&self, predicate: impl Fn(&SessionRecord) -> bool) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| predicate(r))
            .map(Session::from)
            .collect();
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }
}

#[async_trait]
impl SessionRepository for JsonDirSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.file(session_id)?.load().await?.map(Session::from))
    }

    async fn create(&self, session: &Session) -> Result<()> {
        let file = self.file(&session.id)?;
        if file.exists().await? {
            return Err(ScrapegenError::persistence(format!(
                "Session {} already exists",
                session.id
            )));
        }
        file.save(&SessionRecord::from(session)).await?;
        tracing::debug!(
            session_id = %session.id,
            path = %file.path().display(),
            "Session document created"
        );
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<()> {
        let file = self.file(&session.id)?;
        if !file.exists().await? {
            return Err(ScrapegenError::not_found("Session", &session.id));
        }
        file.save(&SessionRecord::from(session)).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        if self.file(session_id)?.remove().await? {
            Ok(())
        } else {
            Err(ScrapegenError::not_found("Session", session_id))
        }
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        self.list_where(|r| r.user_id == owner_id).await
    }

    async fn list_by_target(&self, target_id: &str) -> Result<Vec<Session>> {
        self.list_where(|r| r.competitor_id == target_id).await
    }
}
