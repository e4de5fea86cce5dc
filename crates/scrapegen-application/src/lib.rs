//! Application layer for scrapegen.
//!
//! This crate provides the use case that coordinates the session state machine,
//! the template assembler, the script validator and persistence.

pub mod session;
pub mod session_usecase;

pub use session_usecase::{AssemblyRun, PhaseApproval, ScraperSessionUseCase};
