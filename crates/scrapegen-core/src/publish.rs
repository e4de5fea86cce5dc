//! Publishing validated scripts as runnable scraper assets.

use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;

/// Stores a validated script somewhere a scheduler can run it from.
#[async_trait]
pub trait ScriptPublisher: Send + Sync {
    /// Persists `script` for `session` and returns the new scraper's ID.
    async fn publish(&self, session: &Session, script: &str) -> Result<String>;
}
