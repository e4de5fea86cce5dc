use super::CliContext;
use anyhow::{Context, Result, bail};
use clap::Args;
use scrapegen_core::assembly::{
    Fragments, LiteralAnchorAssembler, TemplateAssembler, TemplateMetadata,
};
use scrapegen_core::contract::ScrapeContext;
use scrapegen_core::session::CollectionStrategy;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AssembleArgs {
    /// URL-discovery fragment
    #[arg(long)]
    discovery: Option<PathBuf>,
    /// Record-extraction fragment
    #[arg(long)]
    extraction: Option<PathBuf>,
    /// `api` or `scraping`
    #[arg(long, default_value = "scraping")]
    strategy: String,
    /// Target URL written into the script metadata
    #[arg(long, default_value = "https://example.com")]
    url: String,
}

fn read_fragment(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => Ok(String::new()),
    }
}

pub async fn assemble(context: &CliContext, args: AssembleArgs) -> Result<()> {
    let Some(strategy) = CollectionStrategy::parse(&args.strategy) else {
        bail!("Unknown strategy '{}', expected api or scraping", args.strategy);
    };
    let fragments = Fragments {
        strategy,
        discovery_code: read_fragment(args.discovery.as_deref())?,
        extraction_code: read_fragment(args.extraction.as_deref())?,
        api_endpoints: None,
    };

    let template = context.base_template().await?;
    let report = LiteralAnchorAssembler::default().assemble_with_report(
        &template,
        &fragments,
        &TemplateMetadata::for_target(&args.url),
    );
    for skipped in &report.skipped {
        eprintln!("skipped {}: {:?}", skipped.anchor, skipped.reason);
    }
    print!("{}", report.script);
    Ok(())
}

pub async fn validate(context: &CliContext, script: &Path) -> Result<()> {
    let source = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let result = context.validator()?.validate(&source).await?;
    if result.valid {
        println!("✅ {} passed all validation gates", script.display());
        Ok(())
    } else {
        bail!(
            "{} failed validation: {}",
            script.display(),
            result.error.unwrap_or_default()
        )
    }
}

pub fn decode_context(value: &str) -> Result<()> {
    let context = ScrapeContext::decode(value)?;
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}
