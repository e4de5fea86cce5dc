//! Session domain module.
//!
//! # Module Structure
//!
//! - `phase`: Pipeline phases and legacy name mapping (`Phase`)
//! - `phase_data`: Per-phase result bags (`AnalysisData`, `ExtractionData`, ...)
//! - `model`: Core session domain model (`Session`)
//! - `machine`: Phase transitions (`update_phase_data`, `approve_phase`, `canonical_phase`)
//! - `repository`: Repository trait for session persistence
//!
//! # Usage
//!
//! ```ignore
//! use scrapegen_core::session::{Session, SessionRepository, Phase};
//! use scrapegen_core::session::{approve_phase, update_phase_data, PhasePayload};
//! ```

mod machine;
mod model;
mod phase;
mod phase_data;
mod repository;

// Re-export public API
pub use machine::{ApprovalOutcome, PhasePayload, approve_phase, canonical_phase, update_phase_data};
pub use model::Session;
pub use phase::{LEGACY_DATA_EXTRACTION, LEGACY_URL_COLLECTION, Phase};
pub use phase_data::{
    AnalysisData, ApiEndpointInfo, AssemblyData, CollectionStrategy, ExtractedProduct,
    ExtractionData, UrlCollectionData, ValidationResult,
};
pub use repository::SessionRepository;
