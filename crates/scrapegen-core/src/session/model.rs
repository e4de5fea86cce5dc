//! Core session domain model.

use super::phase::Phase;
use super::phase_data::{AnalysisData, AssemblyData, ExtractionData, UrlCollectionData};
use chrono::Utc;
use uuid::Uuid;

/// One end-to-end scraper generation attempt.
///
/// `current_phase` is always canonical in memory: legacy phase names are mapped
/// by the persistence layer before a `Session` is built. Mutations go through
/// [`update_phase_data`](super::update_phase_data) and
/// [`approve_phase`](super::approve_phase), both of which call [`Session::touch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque session identifier (UUID v4 for sessions created here)
    pub id: String,
    /// The user who owns this session
    pub owner_id: String,
    /// The site being scraped (competitor reference)
    pub target_id: String,
    /// Source URL submitted when the session was created
    pub url: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last mutated (ISO 8601 format)
    pub updated_at: String,
    pub current_phase: Phase,
    pub analysis_data: AnalysisData,
    /// Vestigial bag carried for sessions created before URL collection was
    /// folded into data validation.
    pub url_collection_data: UrlCollectionData,
    pub extraction_data: ExtractionData,
    pub assembly_data: AssemblyData,
}

impl Session {
    /// Starts a session at [`Phase::Analysis`] with every bag empty and unapproved.
    pub fn new(
        owner_id: impl Into<String>,
        target_id: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            target_id: target_id.into(),
            url: url.into(),
            created_at: now.clone(),
            updated_at: now,
            current_phase: Phase::Analysis,
            analysis_data: AnalysisData::default(),
            url_collection_data: UrlCollectionData::default(),
            extraction_data: ExtractionData::default(),
            assembly_data: AssemblyData::default(),
        }
    }

    /// Refreshes `updated_at`.
    ///
    /// The new timestamp is strictly later than the previous one when both were
    /// produced by this clock, so listings ordered by `updated_at` stay stable
    /// even for mutations within the same instant.
    pub fn touch(&mut self) {
        let now = Utc::now();
        let next = match chrono::DateTime::parse_from_rfc3339(&self.updated_at) {
            Ok(previous) if previous >= now => {
                previous.with_timezone(&Utc) + chrono::Duration::microseconds(1)
            }
            _ => now,
        };
        self.updated_at = next.to_rfc3339();
    }

    /// The phase this session is really in, derived from its data.
    ///
    /// See [`canonical_phase`](super::canonical_phase).
    pub fn canonical_phase(&self) -> Phase {
        super::machine::canonical_phase(self)
    }

    /// Whether data-validation phase data exists, counting the vestigial
    /// URL-collection bag.
    pub fn has_validation_data(&self) -> bool {
        self.extraction_data.has_data() || self.url_collection_data.has_data()
    }

    /// The URL-discovery fragment, falling back to the vestigial bag.
    pub fn discovery_code(&self) -> Option<&str> {
        self.extraction_data
            .discovery_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .or_else(|| {
                self.url_collection_data
                    .generated_code
                    .as_deref()
                    .filter(|code| !code.trim().is_empty())
            })
    }
}
