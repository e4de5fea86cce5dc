//! Persistence DTOs.
//!
//! Stored documents use their own field names and may carry legacy values.
//! These types are the only place that knows the stored shape; everything
//! above the repository works with the normalized domain types.

mod session;

pub use session::{AnalysisDataRecord, SessionRecord};
