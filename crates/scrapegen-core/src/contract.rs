//! The command-line contract every generated script exposes.
//!
//! `metadata` prints one [`ScriptMetadata`] JSON line. `scrape --context=<blob>`
//! takes a [`ScrapeContext`], base64-encoded or raw JSON, prints one JSON record
//! per product on stdout and reports on stderr with [`OutputLine`] prefixes.

use crate::error::{Result, ScrapegenError};
use crate::session::{CollectionStrategy, Session};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCRIPT_VERSION: &str = "1.0.0";
pub const GENERATION_METHOD: &str = "multi-phase-ai";

/// Output of the `metadata` command, also stored beside published scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    pub target_url: String,
    #[serde(default)]
    pub required_libraries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_strategy: Option<CollectionStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_timestamp: Option<DateTime<Utc>>,
}

impl ScriptMetadata {
    /// Metadata for a script generated from `session`.
    pub fn for_session(session: &Session, generated_at: DateTime<Utc>) -> Self {
        let template = crate::assembly::TemplateMetadata::for_target(&session.url);
        Self {
            name: template.title,
            description: template.description,
            version: SCRIPT_VERSION.to_string(),
            target_url: template.target_url,
            required_libraries: ["crawlee", "playwright", "yargs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            collection_strategy: Some(session.analysis_data.proposed_strategy.unwrap_or_default()),
            generation_method: Some(GENERATION_METHOD.to_string()),
            generation_timestamp: Some(generated_at),
        }
    }
}

/// Run options handed to `scrape --context`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeContext {
    pub active_brand_ids: Vec<String>,
    pub filter_by_active_brands: bool,
    pub own_product_eans: Vec<String>,
    pub own_product_skus: Vec<String>,
    pub scrape_only_own_products: bool,
    pub is_test_run: bool,
    pub is_validation_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl ScrapeContext {
    /// Base64 of the JSON form.
    pub fn encode(&self) -> Result<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Accepts base64-encoded JSON first, then raw JSON.
    pub fn decode(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let base64_error = match STANDARD.decode(raw) {
            Ok(bytes) => match serde_json::from_slice::<Self>(&bytes) {
                Ok(context) => return Ok(context),
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };
        serde_json::from_str::<Self>(raw).map_err(|json_error| ScrapegenError::Serialization {
            format: "context".to_string(),
            message: format!(
                "Failed to parse context: tried Base64 decoding and direct JSON parsing, both failed. \
                 Base64 error: {base64_error}. JSON error: {json_error}"
            ),
        })
    }
}

/// One line a script writes while scraping.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    /// `PROGRESS: ...` on stderr.
    Progress(String),
    /// `ERROR: ...` on stderr.
    Error(String),
    /// A JSON object on stdout.
    Record(serde_json::Map<String, serde_json::Value>),
    /// Anything else; a contract violation consumers may drop.
    Unrecognized(String),
}

impl OutputLine {
    pub const PROGRESS_PREFIX: &'static str = "PROGRESS:";
    pub const ERROR_PREFIX: &'static str = "ERROR:";

    pub fn from_stderr(line: &str) -> Self {
        if let Some(rest) = line.strip_prefix(Self::PROGRESS_PREFIX) {
            OutputLine::Progress(rest.trim().to_string())
        } else if let Some(rest) = line.strip_prefix(Self::ERROR_PREFIX) {
            OutputLine::Error(rest.trim().to_string())
        } else {
            OutputLine::Unrecognized(line.to_string())
        }
    }

    pub fn from_stdout(line: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(line.trim()) {
            Ok(serde_json::Value::Object(record)) => OutputLine::Record(record),
            _ => OutputLine::Unrecognized(line.to_string()),
        }
    }
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLine::Progress(message) => write!(f, "{} {}", Self::PROGRESS_PREFIX, message),
            OutputLine::Error(message) => write!(f, "{} {}", Self::ERROR_PREFIX, message),
            OutputLine::Record(record) => {
                let json = serde_json::to_string(record).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            OutputLine::Unrecognized(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ScrapeContext {
        ScrapeContext {
            active_brand_ids: vec!["b1".to_string()],
            filter_by_active_brands: true,
            is_test_run: true,
            run_id: Some("run-7".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_accepts_base64() {
        let encoded = context().encode().unwrap();
        assert_eq!(ScrapeContext::decode(&encoded).unwrap(), context());
    }

    #[test]
    fn test_decode_falls_back_to_json() {
        let raw = r#"{"scrapeOnlyOwnProducts":true,"ownProductEans":["123"]}"#;
        let decoded = ScrapeContext::decode(raw).unwrap();
        assert!(decoded.scrape_only_own_products);
        assert_eq!(decoded.own_product_eans, vec!["123"]);
    }

    #[test]
    fn test_decode_error_cites_both_attempts() {
        let err = ScrapeContext::decode("not a context").unwrap_err().to_string();
        assert!(err.contains("Base64 error"));
        assert!(err.contains("JSON error"));
    }

    #[test]
    fn test_stderr_lines_are_classified() {
        assert_eq!(
            OutputLine::from_stderr("PROGRESS: Discovered 12 product URLs"),
            OutputLine::Progress("Discovered 12 product URLs".to_string())
        );
        assert_eq!(
            OutputLine::from_stderr("ERROR: Request failed"),
            OutputLine::Error("Request failed".to_string())
        );
        assert!(matches!(
            OutputLine::from_stderr("(node:1) Warning"),
            OutputLine::Unrecognized(_)
        ));
        assert_eq!(OutputLine::Progress("x".to_string()).to_string(), "PROGRESS: x");
    }

    #[test]
    fn test_stdout_records_must_be_objects() {
        assert!(matches!(
            OutputLine::from_stdout(r#"{"name":"Kettle","price":199}"#),
            OutputLine::Record(record) if record["name"] == "Kettle"
        ));
        assert!(matches!(OutputLine::from_stdout("[1,2]"), OutputLine::Unrecognized(_)));
    }

    #[test]
    fn test_metadata_for_session() {
        let session = Session::new("u", "c", "https://shop.test/sv");
        let metadata = ScriptMetadata::for_session(&session, Utc::now());
        assert_eq!(metadata.name, "AI Generated Scraper for shop.test");
        assert_eq!(metadata.version, SCRIPT_VERSION);
        assert_eq!(metadata.collection_strategy, Some(CollectionStrategy::Scraping));

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["target_url"], "https://shop.test/sv");
        assert_eq!(json["generation_method"], GENERATION_METHOD);
    }
}
