use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::session::SessionAction;

#[derive(Parser)]
#[command(name = "scrapegen")]
#[command(about = "Scrapegen CLI - phased, human-supervised scraper generation", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/scrapegen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `scrapegen_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage generation sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Splice fragment files into the base template and print the script
    Assemble(commands::script::AssembleArgs),
    /// Run the validation gates against a script file
    Validate {
        /// Script to validate
        script: PathBuf,
    },
    /// Decode a `scrape --context` value (base64 or raw JSON)
    DecodeContext {
        value: String,
    },
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let context = commands::CliContext::load(cli.config)?;

    match cli.command {
        Commands::Session { action } => commands::session::run(&context, action).await?,
        Commands::Assemble(args) => commands::script::assemble(&context, args).await?,
        Commands::Validate { script } => commands::script::validate(&context, &script).await?,
        Commands::DecodeContext { value } => commands::script::decode_context(&value)?,
    }

    Ok(())
}
