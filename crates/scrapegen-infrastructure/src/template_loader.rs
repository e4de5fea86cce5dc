//! Resolves the base scraper template.

use scrapegen_core::assembly::BUILTIN_TEMPLATE;
use scrapegen_core::config::TemplateSettings;
use scrapegen_core::{Result, ScrapegenError};

/// Returns the configured template file's contents, or the built-in template
/// when no path is configured.
pub async fn load_base_template(settings: &TemplateSettings) -> Result<String> {
    match &settings.path {
        Some(path) => {
            let template = tokio::fs::read_to_string(path).await.map_err(|e| {
                ScrapegenError::config(format!(
                    "Failed to read base template {}: {}",
                    path.display(),
                    e
                ))
            })?;
            tracing::debug!(path = %path.display(), "Loaded base template");
            Ok(template)
        }
        None => Ok(BUILTIN_TEMPLATE.to_string()),
    }
}
