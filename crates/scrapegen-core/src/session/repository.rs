//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// Decouples the state machine from the document store backing it. Sessions
/// handed out by an implementation are already normalized: canonical phase,
/// merged product URL aliases.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Report store failures as [`ScrapegenError::Persistence`](crate::error::ScrapegenError::Persistence)
/// - Never retry internally
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Stores a new session.
    async fn create(&self, session: &Session) -> Result<()>;

    /// Replaces a stored session.
    ///
    /// Fails with `NotFound` if no session with this ID exists.
    async fn update(&self, session: &Session) -> Result<()>;

    /// Deletes a session from storage.
    ///
    /// Fails with `NotFound` if no session with this ID exists.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists sessions owned by a user, most recently updated first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>>;

    /// Lists sessions for a target site, most recently updated first.
    async fn list_by_target(&self, target_id: &str) -> Result<Vec<Session>>;
}
