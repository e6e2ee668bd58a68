pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, ResearchStore};

#[derive(Parser)]
#[command(name = "research-portal")]
#[command(about = "Research portal analytics service and reporting CLI")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Read from a JSON fixture instead of DATABASE_URL")]
    pub fixture: Option<PathBuf>,

    #[arg(long, global = true, help = "Print JSON on a single line")]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Compute an analytics view and print it as JSON")]
    Report {
        #[command(subcommand)]
        cmd: commands::report::ReportCommands,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.compact {
            OutputFormat::Compact
        } else {
            OutputFormat::Pretty
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(config, cli.fixture.as_deref(), port).await,
        Commands::Report { cmd } => {
            commands::report::handle(cmd, &config, cli.fixture.as_deref(), output_format).await
        }
    }
}

/// Fixture file when given, Postgres otherwise.
pub async fn open_store(config: &AppConfig, fixture: Option<&Path>) -> anyhow::Result<Arc<dyn ResearchStore>> {
    match fixture {
        Some(path) => {
            let store = MemoryStore::load(path)
                .await
                .with_context(|| format!("failed to load fixture {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            let store = PgStore::connect(&config.database, &config.analytics.active_rule)
                .await
                .context("failed to connect to the database")?;
            Ok(Arc::new(store))
        }
    }
}
