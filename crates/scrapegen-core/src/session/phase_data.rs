//! Per-phase result bags stored on a [`Session`](super::Session).
//!
//! Each bag is independently mutable and carries its own `approved` flag.
//! Bag bodies serialize with the camelCase keys used by the stored documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};

/// How a generated scraper collects its products.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollectionStrategy {
    /// Query the site's JSON endpoints directly.
    Api,
    /// Crawl listing and product pages.
    #[default]
    Scraping,
}

impl CollectionStrategy {
    /// Lenient parse of a strategy tag produced by the generative service.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "api" => Some(Self::Api),
            "scraping" | "scrape" => Some(Self::Scraping),
            _ => None,
        }
    }
}

/// A candidate API endpoint discovered during site analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpointInfo {
    pub url: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_product_list: bool,
    #[serde(default)]
    pub is_product_detail: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

/// Site-structure facts discovered in the analysis phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub sitemap_urls: Vec<String>,
    #[serde(default)]
    pub brand_pages: Vec<String>,
    #[serde(default)]
    pub category_pages: Vec<String>,
    /// Candidate product URLs. Stored documents may carry this list under the
    /// legacy `productListingPages` key instead.
    #[serde(default)]
    pub product_pages: Vec<String>,
    #[serde(default)]
    pub api_endpoints: Vec<ApiEndpointInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_strategy: Option<CollectionStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_description: Option<String>,
    /// Selector guesses keyed by the field they target (`name`, `price`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub product_selectors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

impl AnalysisData {
    /// The product URL list under its legacy name.
    pub fn product_listing_pages(&self) -> &[String] {
        &self.product_pages
    }

    pub fn has_data(&self) -> bool {
        self.analysis_id.is_some()
            || !self.sitemap_urls.is_empty()
            || !self.brand_pages.is_empty()
            || !self.category_pages.is_empty()
            || !self.product_pages.is_empty()
            || !self.api_endpoints.is_empty()
            || self.proposed_strategy.is_some()
            || self.strategy_description.is_some()
    }
}

/// One record produced by running an extraction fragment against a sample page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedProduct {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_price: Option<String>,
    /// Fields the generated code emitted beyond the known set.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Result of the data-validation phase.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_id: Option<String>,
    /// Record-extraction fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    /// URL-discovery fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_code: Option<String>,
    #[serde(default)]
    pub extracted_products: Vec<ExtractedProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

impl ExtractionData {
    pub fn has_data(&self) -> bool {
        self.extraction_id.is_some()
            || has_text(&self.generated_code)
            || has_text(&self.discovery_code)
            || !self.extracted_products.is_empty()
    }
}

/// Result of the retired URL-collection phase.
///
/// Kept so older sessions keep their data. Its `generated_code` stands in for
/// [`ExtractionData::discovery_code`] when the latter is absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlCollectionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    #[serde(default)]
    pub collected_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_url_count: Option<u64>,
    #[serde(default)]
    pub sample_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

impl UrlCollectionData {
    pub fn has_data(&self) -> bool {
        self.collection_id.is_some()
            || has_text(&self.generated_code)
            || !self.collected_urls.is_empty()
            || !self.sample_urls.is_empty()
    }
}

/// Outcome of running the script validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Result of the assembly phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembled_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_result: Option<ValidationResult>,
    /// Identifier of the runnable asset created from a validated script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraper_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

impl AssemblyData {
    pub fn has_data(&self) -> bool {
        has_text(&self.assembled_script)
    }

    pub fn passed_validation(&self) -> bool {
        self.has_data()
            && self
                .validation_result
                .as_ref()
                .is_some_and(|result| result.valid)
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_alone_is_not_data() {
        let analysis = AnalysisData {
            user_feedback: Some("looks wrong".to_string()),
            ..Default::default()
        };
        assert!(!analysis.has_data());

        let extraction = ExtractionData {
            generated_code: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!extraction.has_data());
    }

    #[test]
    fn test_assembly_passed_validation_requires_script() {
        let mut assembly = AssemblyData {
            validation_result: Some(ValidationResult::valid()),
            ..Default::default()
        };
        assert!(!assembly.passed_validation());

        assembly.assembled_script = Some("const x = 1;".to_string());
        assert!(assembly.passed_validation());

        assembly.validation_result = Some(ValidationResult::invalid("tsc failed"));
        assert!(!assembly.passed_validation());
    }

    #[test]
    fn test_extracted_product_keeps_unknown_fields() {
        let json = r#"{"url":"https://shop.test/p/1","name":"Kettle","price":199.0,
            "currency":"SEK","is_available":true,"color":"red"}"#;
        let product: ExtractedProduct = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Some(199.0));
        assert_eq!(product.extra.get("color"), Some(&serde_json::json!("red")));
    }

    #[test]
    fn test_strategy_parse_is_lenient() {
        assert_eq!(CollectionStrategy::parse(" API "), Some(CollectionStrategy::Api));
        assert_eq!(CollectionStrategy::parse("scraping"), Some(CollectionStrategy::Scraping));
        assert_eq!(CollectionStrategy::parse("graphql"), None);
        assert_eq!(CollectionStrategy::Api.to_string(), "api");
    }
}
