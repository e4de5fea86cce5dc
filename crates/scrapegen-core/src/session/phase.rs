//! Generation phases.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

/// Phase name used by sessions created before URL collection was merged into
/// data validation.
pub const LEGACY_URL_COLLECTION: &str = "url-collection";

/// Phase name used by sessions created before data extraction was merged into
/// data validation.
pub const LEGACY_DATA_EXTRACTION: &str = "data-extraction";

/// A named stage of the generation pipeline.
///
/// Variants are declared in pipeline order, so the derived `Ord` matches the
/// order in which a session visits them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    /// Site structure discovery.
    #[default]
    Analysis,
    /// Extraction code and sample records, surfaced to users as "data validation".
    DataValidation,
    /// Template assembly and script validation.
    Assembly,
    /// Terminal phase: a validated script exists.
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// The phase that follows this one, or `None` for [`Phase::Complete`].
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Analysis => Some(Phase::DataValidation),
            Phase::DataValidation => Some(Phase::Assembly),
            Phase::Assembly => Some(Phase::Complete),
            Phase::Complete => None,
        }
    }

    /// Parses a canonical or legacy phase name.
    ///
    /// Both legacy names collapse into [`Phase::DataValidation`]. Returns `None`
    /// for anything else.
    pub fn parse(raw: &str) -> Option<Phase> {
        match raw.trim() {
            "analysis" => Some(Phase::Analysis),
            "data-validation" => Some(Phase::DataValidation),
            LEGACY_URL_COLLECTION | LEGACY_DATA_EXTRACTION => Some(Phase::DataValidation),
            "assembly" => Some(Phase::Assembly),
            "complete" => Some(Phase::Complete),
            _ => None,
        }
    }

    /// Total version of [`Phase::parse`] used when reading stored documents.
    ///
    /// Unknown values restart the session at [`Phase::Analysis`].
    pub fn normalize(raw: &str) -> Phase {
        match Phase::parse(raw) {
            Some(phase) => {
                if phase.as_str() != raw {
                    tracing::debug!(
                        stored = raw,
                        canonical = phase.as_str(),
                        "Mapped legacy phase"
                    );
                }
                phase
            }
            None => {
                tracing::warn!(stored = raw, "Unknown stored phase, falling back to analysis");
                Phase::Analysis
            }
        }
    }

    pub fn is_legacy_name(raw: &str) -> bool {
        matches!(raw.trim(), LEGACY_URL_COLLECTION | LEGACY_DATA_EXTRACTION)
    }
}
