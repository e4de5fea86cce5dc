//! Session updater helper for the "find → update → save" pattern.

use scrapegen_core::session::{Session, SessionRepository};
use scrapegen_core::{Result, ScrapegenError};
use std::sync::Arc;

/// Loads a session, applies a mutation, refreshes `updated_at` and saves it.
///
/// Nothing is written when the mutation fails. Callers that need the update to
/// be atomic with respect to other callers hold the session's lock from
/// [`SessionLocks`](super::SessionLocks) around the call.
pub struct SessionUpdater {
    repository: Arc<dyn SessionRepository>,
}

impl SessionUpdater {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Applies `updater` and returns the saved session with the closure's value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session doesn't exist
    /// - The updater function returns an error
    /// - Saving to storage fails
    pub async fn update<F, T>(&self, session_id: &str, updater: F) -> Result<(Session, T)>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let mut session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ScrapegenError::not_found("Session", session_id))?;

        let value = updater(&mut session)?;
        session.touch();

        self.repository.update(&session).await?;
        tracing::debug!(session_id = %session.id, phase = %session.current_phase, "Session saved");

        Ok((session, value))
    }
}
