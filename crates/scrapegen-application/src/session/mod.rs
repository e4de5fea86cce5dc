//! Session application services.
//!
//! This module contains the helpers the use case builds on: a per-session lock
//! registry and the load/mutate/save updater.

mod locks;
mod updater;

pub use locks::{SessionGuard, SessionLocks};
pub use updater::SessionUpdater;
