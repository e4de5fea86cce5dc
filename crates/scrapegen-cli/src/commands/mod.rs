pub mod script;
pub mod session;

use anyhow::{Context, Result};
use scrapegen_application::ScraperSessionUseCase;
use scrapegen_core::config::ScrapegenConfig;
use scrapegen_core::validation::ScriptValidator;
use scrapegen_infrastructure::{
    ConfigService, DirScriptPublisher, JsonDirSessionRepository, ScrapegenPaths,
    TokioProcessRunner, load_base_template,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Loaded configuration shared by all commands.
pub struct CliContext {
    pub config: ScrapegenConfig,
}

impl CliContext {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new(),
        };
        let config = service.get_config().context("Failed to load configuration")?;
        tracing::debug!(
            timeout_secs = config.validator.timeout_secs,
            template = ?config.template.path,
            "Configuration loaded"
        );
        Ok(Self { config })
    }

    pub fn validator(&self) -> Result<Arc<ScriptValidator>> {
        let validator = ScriptValidator::new(
            Arc::new(TokioProcessRunner::new()),
            self.config.validator.clone(),
        )
        .context("Failed to build script validator")?;
        Ok(Arc::new(validator))
    }

    pub async fn base_template(&self) -> Result<String> {
        load_base_template(&self.config.template)
            .await
            .context("Failed to load base template")
    }

    /// Wires the use case against the on-disk session and scraper directories.
    pub async fn usecase(&self) -> Result<ScraperSessionUseCase> {
        let storage = &self.config.storage;
        let sessions_dir = ScrapegenPaths::resolve_sessions_dir(storage)
            .context("Failed to resolve sessions directory")?;
        let scrapers_dir = ScrapegenPaths::resolve_scrapers_dir(storage)
            .context("Failed to resolve scrapers directory")?;

        let repository = JsonDirSessionRepository::new(&sessions_dir)
            .await
            .with_context(|| format!("Failed to open {}", sessions_dir.display()))?;

        let usecase = ScraperSessionUseCase::new(
            Arc::new(repository),
            self.validator()?,
            self.base_template().await?,
        )?
        .with_publisher(Arc::new(DirScriptPublisher::new(scrapers_dir)));
        Ok(usecase)
    }
}
