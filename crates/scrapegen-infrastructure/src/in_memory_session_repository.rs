//! In-process SessionRepository implementation.
//!
//! Holds stored documents rather than domain sessions, so reads go through the
//! same normalization as the on-disk repository.

use crate::dto::SessionRecord;
use crate::repository::sort_newest_first;
use async_trait::async_trait;
use scrapegen_core::session::{Session, SessionRepository};
use scrapegen_core::{Result, ScrapegenError};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionRepository {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw document as-is, e.g. one carrying legacy field values.
    pub async fn insert_record(&self, record: SessionRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    pub async fn record(&self, session_id: &str) -> Option<SessionRecord> {
        self.records.read().await.get(session_id).cloned()
    }

    async fn list_where(&self, predicate: impl Fn(&SessionRecord) -> bool) -> Vec<Session> {
        let records = self.records.read().await;
        let mut sessions: Vec<Session> = records
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .map(Session::from)
            .collect();
        sort_newest_first(&mut sessions);
        sessions
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.record(session_id).await.map(Session::from))
    }

    async fn create(&self, session: &Session) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&session.id) {
            return Err(ScrapegenError::persistence(format!(
                "Session {} already exists",
                session.id
            )));
        }
        records.insert(session.id.clone(), SessionRecord::from(session));
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&session.id) {
            Some(record) => {
                *record = SessionRecord::from(session);
                Ok(())
            }
            None => Err(ScrapegenError::not_found("Session", &session.id)),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        match self.records.write().await.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(ScrapegenError::not_found("Session", session_id)),
        }
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        Ok(self.list_where(|r| r.user_id == owner_id).await)
    }

    async fn list_by_target(&self, target_id: &str) -> Result<Vec<Session>> {
        Ok(self.list_where(|r| r.competitor_id == target_id).await)
    }
}
