use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// The insertion points of a base template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum AnchorKind {
    Strategy,
    ApiEndpoints,
    UrlDiscovery,
    RecordExtraction,
    MetadataName,
    MetadataDescription,
    MetadataTargetUrl,
}

/// Literal anchor lines looked up in a base template.
///
/// Each value is matched as an exact substring; leading indentation in the
/// template is preserved by the splice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorSet {
    pub strategy: String,
    pub api_endpoints: String,
    pub url_discovery: String,
    pub record_extraction: String,
    pub metadata_name: String,
    pub metadata_description: String,
    pub metadata_target_url: String,
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self {
            strategy: "const COLLECTION_STRATEGY = 'scraping';".to_string(),
            api_endpoints: "const API_ENDPOINTS = {".to_string(),
            url_discovery: "async function collectProductUrls(page, baseUrl) {".to_string(),
            record_extraction: "async function extractProductData(page, url) {".to_string(),
            metadata_name: "name: \"Base Scraper Template\",".to_string(),
            metadata_description:
                "description: \"Multi-phase AI-generated scraper with placeholders\",".to_string(),
            metadata_target_url: "target_url: \"https://example.com\",".to_string(),
        }
    }
}

impl AnchorSet {
    pub fn get(&self, kind: AnchorKind) -> &str {
        match kind {
            AnchorKind::Strategy => &self.strategy,
            AnchorKind::ApiEndpoints => &self.api_endpoints,
            AnchorKind::UrlDiscovery => &self.url_discovery,
            AnchorKind::RecordExtraction => &self.record_extraction,
            AnchorKind::MetadataName => &self.metadata_name,
            AnchorKind::MetadataDescription => &self.metadata_description,
            AnchorKind::MetadataTargetUrl => &self.metadata_target_url,
        }
    }
}
