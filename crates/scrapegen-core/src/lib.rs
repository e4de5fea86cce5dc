//! Domain core of Scrapegen.
//!
//! A [`session::Session`] walks through the generation phases under the rules
//! in [`session`]. Its phase data feeds the [`assembly`] module, whose output is
//! checked by the [`validation`] module before it can be published.

pub mod assembly;
pub mod config;
pub mod contract;
pub mod error;
pub mod feedback;
pub mod publish;
pub mod session;
pub mod validation;

// Re-export common error type
pub use error::{Result, ScrapegenError};
