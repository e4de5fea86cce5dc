use super::endpoints::ApiEndpointsConfig;
use crate::session::{CollectionStrategy, Session};
use url::Url;

const FALLBACK_HOST: &str = "example.com";

/// Generated code and configuration spliced into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub strategy: CollectionStrategy,
    /// Replaces the URL-discovery function header. Empty means keep the stub.
    pub discovery_code: String,
    /// Replaces the record-extraction function header. Empty means keep the stub.
    pub extraction_code: String,
    pub api_endpoints: Option<ApiEndpointsConfig>,
}

/// Values written into the template's metadata lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMetadata {
    pub title: String,
    pub description: String,
    pub target_url: String,
}

impl TemplateMetadata {
    /// Title and description derived from the host of `target_url`.
    pub fn for_target(target_url: &str) -> Self {
        let host = host_of(target_url);
        Self {
            title: format!("AI Generated Scraper for {host}"),
            description: format!("Multi-phase AI-generated scraper for {host}"),
            target_url: target_url.to_string(),
        }
    }
}

/// Everything the assembler needs, gathered from a session's phase data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyInputs {
    pub fragments: Fragments,
    pub metadata: TemplateMetadata,
}

impl AssemblyInputs {
    /// Collects fragments from the analysis and data-validation bags.
    ///
    /// The strategy defaults to scraping. An endpoints block is only produced
    /// for the `api` strategy when a product-list endpoint can be chosen.
    pub fn from_session(session: &Session) -> Self {
        let analysis = &session.analysis_data;
        let strategy = analysis.proposed_strategy.unwrap_or_default();
        let api_endpoints = match strategy {
            CollectionStrategy::Api => ApiEndpointsConfig::select(&analysis.api_endpoints),
            CollectionStrategy::Scraping => None,
        };

        let fragments = Fragments {
            strategy,
            discovery_code: session.discovery_code().unwrap_or_default().to_string(),
            extraction_code: session
                .extraction_data
                .generated_code
                .clone()
                .unwrap_or_default(),
            api_endpoints,
        };

        Self {
            fragments,
            metadata: TemplateMetadata::for_target(&session.url),
        }
    }
}

fn host_of(target_url: &str) -> String {
    Url::parse(target_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}
