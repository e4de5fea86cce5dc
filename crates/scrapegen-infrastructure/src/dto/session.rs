//! Session document DTOs and their mapping to the domain model.

use serde::{Deserialize, Serialize};

use scrapegen_core::session::{
    AnalysisData, AssemblyData, ExtractionData, Phase, Session, UrlCollectionData,
};

// ============================================================================
// Analysis bag (Anti-Corruption Layer for the product URL alias)
// ============================================================================

/// Stored analysis bag.
///
/// The product URL list has been written under both `productListingPages`
/// (legacy) and `productPages` (current). Reading prefers the current name
/// when it is populated; writing emits both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDataRecord {
    #[serde(flatten)]
    pub body: AnalysisData,
    #[serde(default)]
    pub product_listing_pages: Vec<String>,
}

impl From<AnalysisDataRecord> for AnalysisData {
    fn from(record: AnalysisDataRecord) -> Self {
        let mut data = record.body;
        if data.product_pages.is_empty() && !record.product_listing_pages.is_empty() {
            tracing::debug!("Mirroring legacy productListingPages into productPages");
            data.product_pages = record.product_listing_pages;
        }
        data
    }
}

impl From<&AnalysisData> for AnalysisDataRecord {
    fn from(data: &AnalysisData) -> Self {
        Self {
            body: data.clone(),
            product_listing_pages: data.product_pages.clone(),
        }
    }
}

// ============================================================================
// Session document
// ============================================================================

/// One stored session document, keyed by `id`.
///
/// Top-level keys are snake_case. `current_phase` is kept as a raw string so
/// that legacy phase names load without error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub competitor_id: String,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    pub current_phase: String,
    #[serde(default)]
    pub analysis_data: Option<AnalysisDataRecord>,
    #[serde(default)]
    pub url_collection_data: Option<UrlCollectionData>,
    #[serde(default)]
    pub data_extraction_data: Option<ExtractionData>,
    #[serde(default)]
    pub assembly_data: Option<AssemblyData>,
}

/// Convert DTO to domain model.
///
/// Total: unknown phases fall back to analysis, missing bags become empty.
impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        let current_phase = Phase::normalize(&record.current_phase);
        if Phase::is_legacy_name(&record.current_phase) {
            tracing::info!(
                session_id = %record.id,
                stored = %record.current_phase,
                canonical = %current_phase,
                "Normalized legacy session phase"
            );
        }

        Session {
            id: record.id,
            owner_id: record.user_id,
            target_id: record.competitor_id,
            url: record.url,
            created_at: record.created_at,
            updated_at: record.updated_at,
            current_phase,
            analysis_data: record.analysis_data.map(Into::into).unwrap_or_default(),
            url_collection_data: record.url_collection_data.unwrap_or_default(),
            extraction_data: record.data_extraction_data.unwrap_or_default(),
            assembly_data: record.assembly_data.unwrap_or_default(),
        }
    }
}

/// Convert domain model to DTO.
impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        SessionRecord {
            id: session.id.clone(),
            user_id: session.owner_id.clone(),
            competitor_id: session.target_id.clone(),
            url: session.url.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            current_phase: session.current_phase.as_str().to_string(),
            analysis_data: Some((&session.analysis_data).into()),
            url_collection_data: Some(session.url_collection_data.clone()),
            data_extraction_data: Some(session.extraction_data.clone()),
            assembly_data: Some(session.assembly_data.clone()),
        }
    }
}
