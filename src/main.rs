//! letras - CLI entry point.
//!
//! `letras run full` crawls the entire catalogue, `letras run incremental`
//! picks up new artists and refreshes view counts, `letras run init` only
//! bootstraps the database schema.

use anyhow::Result;
use clap::{Parser, Subcommand};
use letras::config::Config;
use letras::fetch::Fetcher;
use letras::filter::FilterChain;
use letras::pipeline::{Mode, Orchestrator};
use letras::release::Packager;
use letras::scrape::Scraper;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "letras")]
#[command(about = "Gospel lyrics harvester for letras.mus.br")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "LETRAS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a pipeline run
    Run {
        #[command(subcommand)]
        mode: RunMode,
    },
}

#[derive(Subcommand, Debug)]
enum RunMode {
    /// Full crawl of the entire artist catalogue
    Full {
        /// Output directory for release artifacts
        #[arg(short, long, default_value = "data")]
        output: PathBuf,
    },
    /// Incremental update: new artists plus a views-refresh sweep
    Incremental {
        /// Output directory for release artifacts
        #[arg(short, long, default_value = "data")]
        output: PathBuf,
    },
    /// Initialize the database schema and exit
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "letras=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    info!("letras {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());

    let (mode, output) = match cli.command {
        Command::Run {
            mode: RunMode::Init,
        } => {
            let pool = letras::db::connect(&config.database_path).await?;
            pool.close().await;
            info!("Database initialized");
            return Ok(());
        }
        Command::Run {
            mode: RunMode::Full { output },
        } => (Mode::Full, output),
        Command::Run {
            mode: RunMode::Incremental { output },
        } => (Mode::Incremental, output),
    };

    let pool = letras::db::connect(&config.database_path).await?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing in-flight work");
            ctrl_c_token.cancel();
        }
    });

    let fetcher = Fetcher::new(&config)?;
    let scraper = Arc::new(Scraper::new(fetcher, config.index_path.clone()));
    let filter = Arc::new(FilterChain::new(&config.filters));
    let packager = Packager::new(pool.clone(), config.snapshot_in_release);

    let orchestrator = Orchestrator::new(pool.clone(), scraper, filter, packager, cancel);
    let summary = orchestrator.run(mode, &output).await?;

    pool.close().await;

    if summary.failures > 0 {
        eprintln!(
            "Run finished with {} failed work items (see log)",
            summary.failures
        );
    }

    Ok(())
}
