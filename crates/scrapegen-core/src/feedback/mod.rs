//! Feedback composer.
//!
//! Turns a phase artifact plus user feedback into a system/user prompt pair for
//! the generative service. Nothing here touches session state; the service's
//! answer comes back through `update_phase_data`.

mod templates;

use crate::error::Result;
use crate::session::{
    AnalysisData, AssemblyData, ExtractionData, LEGACY_DATA_EXTRACTION, LEGACY_URL_COLLECTION,
    Session, UrlCollectionData,
};
use minijinja::{Environment, context};

/// List previews show at most this many entries.
pub const PREVIEW_LIMIT: usize = 5;
/// Scripts longer than this many characters are cut in assembly prompts.
pub const SCRIPT_PREVIEW_CHARS: usize = 5000;
/// Extraction prompts include at most this many sample records.
pub const SAMPLE_RECORDS: usize = 2;

const TRUNCATION_NOTE: &str = "\n... (script truncated for brevity)";

/// A rendered request for the generative service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

/// The artifact feedback refers to.
#[derive(Debug, Clone, Copy)]
pub enum PhaseArtifact<'a> {
    Analysis {
        url: &'a str,
        data: &'a AnalysisData,
    },
    UrlCollection(&'a UrlCollectionData),
    DataValidation(&'a ExtractionData),
    Assembly(&'a AssemblyData),
    /// Fallback for phases without a dedicated template.
    General { phase: &'a str, code: &'a str },
}

impl<'a> PhaseArtifact<'a> {
    /// Picks the artifact for a phase name. Legacy phase names select their
    /// historical templates.
    pub fn from_session(session: &'a Session, phase: &'a str) -> Self {
        match phase {
            "analysis" => PhaseArtifact::Analysis {
                url: &session.url,
                data: &session.analysis_data,
            },
            LEGACY_URL_COLLECTION => PhaseArtifact::UrlCollection(&session.url_collection_data),
            "data-validation" | LEGACY_DATA_EXTRACTION => {
                PhaseArtifact::DataValidation(&session.extraction_data)
            }
            "assembly" => PhaseArtifact::Assembly(&session.assembly_data),
            other => PhaseArtifact::General {
                phase: other,
                code: session
                    .extraction_data
                    .generated_code
                    .as_deref()
                    .unwrap_or_default(),
            },
        }
    }

    fn template_name(&self) -> &'static str {
        match self {
            PhaseArtifact::Analysis { .. } => "analysis",
            PhaseArtifact::UrlCollection(_) => "url-collection",
            PhaseArtifact::DataValidation(_) => "data-validation",
            PhaseArtifact::Assembly(_) => "assembly",
            PhaseArtifact::General { .. } => "general",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            PhaseArtifact::Analysis { .. } => templates::ANALYSIS_SYSTEM,
            PhaseArtifact::UrlCollection(_) => templates::URL_COLLECTION_SYSTEM,
            PhaseArtifact::DataValidation(_) => templates::DATA_VALIDATION_SYSTEM,
            PhaseArtifact::Assembly(_) => templates::ASSEMBLY_SYSTEM,
            PhaseArtifact::General { .. } => templates::GENERAL_SYSTEM,
        }
    }
}

pub struct FeedbackComposer {
    env: Environment<'static>,
}

impl FeedbackComposer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("analysis", templates::ANALYSIS_USER)?;
        env.add_template("url-collection", templates::URL_COLLECTION_USER)?;
        env.add_template("data-validation", templates::DATA_VALIDATION_USER)?;
        env.add_template("assembly", templates::ASSEMBLY_USER)?;
        env.add_template("general", templates::GENERAL_USER)?;
        Ok(Self { env })
    }

    pub fn compose(&self, artifact: PhaseArtifact<'_>, feedback: &str) -> Result<ComposedPrompt> {
        let template = self.env.get_template(artifact.template_name())?;
        let user = match artifact {
            PhaseArtifact::Analysis { url, data } => template.render(context! {
                url,
                feedback,
                strategy => data
                    .proposed_strategy
                    .map_or_else(|| "unknown".to_string(), |s| s.to_string()),
                strategy_description => data
                    .strategy_description
                    .as_deref()
                    .unwrap_or("None provided"),
                sitemaps => preview(&data.sitemap_urls),
                brand_pages => preview(&data.brand_pages),
                category_pages => preview(&data.category_pages),
                product_pages => preview(data.product_listing_pages()),
                api_endpoints => data
                    .api_endpoints
                    .iter()
                    .map(|e| format!("{} ({})", e.url, e.method))
                    .collect::<Vec<_>>(),
            })?,
            PhaseArtifact::UrlCollection(data) => template.render(context! {
                feedback,
                code => data.generated_code.as_deref().unwrap_or_default(),
                total_count => data.total_url_count.unwrap_or(data.collected_urls.len() as u64),
                sample_urls => data
                    .sample_urls
                    .iter()
                    .take(PREVIEW_LIMIT)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n"),
            })?,
            PhaseArtifact::DataValidation(data) => {
                let count = data.extracted_products.len();
                let shown = &data.extracted_products[..count.min(SAMPLE_RECORDS)];
                let samples = serde_json::to_string_pretty(shown)?;
                template.render(context! {
                    feedback,
                    samples,
                    code => data.generated_code.as_deref().unwrap_or_default(),
                    product_count => count,
                })?
            }
            PhaseArtifact::Assembly(data) => {
                let result = data.validation_result.as_ref();
                template.render(context! {
                    feedback,
                    valid => result.is_some_and(|r| r.valid),
                    validation_error => result
                        .and_then(|r| r.error.as_deref())
                        .unwrap_or("Unknown error"),
                    script => truncate_script(data.assembled_script.as_deref().unwrap_or_default()),
                })?
            }
            PhaseArtifact::General { phase, code } => template.render(context! {
                phase,
                code,
                feedback,
            })?,
        };

        tracing::debug!(template = artifact.template_name(), "Composed feedback prompt");
        Ok(ComposedPrompt {
            system: artifact.system_prompt().to_string(),
            user,
        })
    }
}

/// Comma-joined preview of at most [`PREVIEW_LIMIT`] entries.
fn preview(items: &[String]) -> String {
    if items.is_empty() {
        return "None found".to_string();
    }
    let shown = items
        .iter()
        .take(PREVIEW_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > PREVIEW_LIMIT {
        format!("{shown}...")
    } else {
        shown
    }
}

fn truncate_script(script: &str) -> String {
    match script.char_indices().nth(SCRIPT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &script[..cut], TRUNCATION_NOTE),
        None => script.to_string(),
    }
}
