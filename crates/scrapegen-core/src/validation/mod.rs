//! Script validation.
//!
//! An assembled script passes three gates in order: a static check, a
//! metadata check and a structural check. The first failing gate decides the
//! result. Gate failures are ordinary [`ValidationResult`] values; only
//! infrastructure failures (spawning a process, managing the workspace) are
//! errors.
//!
//! [`ValidationResult`]: crate::session::ValidationResult

mod runner;
mod validator;

pub use runner::{ProcessOutput, ProcessRunner, RunnerError};
pub use validator::{Gate, ScriptValidator, StructuralCheck, STRUCTURAL_CHECKS};
