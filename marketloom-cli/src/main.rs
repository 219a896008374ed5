//! marketloom CLI — run the integration pipeline and inspect sources.
//!
//! Commands:
//! - `run` — execute one integration pass against a filesystem store
//! - `sources` — report presence and row counts of the four extracts

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use marketloom_pipeline::{integrate_entry, loader, FsStore, IntegrateConfig};

#[derive(Parser)]
#[command(
    name = "marketloom",
    about = "marketloom — hourly market-data integration pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one integration pass against a filesystem store.
    Run {
        /// Store root directory holding the cleaned_data/ inputs.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the cutoff instant (RFC 3339, e.g. 2025-08-03T05:00:00Z).
        #[arg(long)]
        cutoff: Option<String>,
    },
    /// Report presence and row counts of the four extracts.
    Sources {
        /// Store root directory holding the cleaned_data/ inputs.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data_dir,
            config,
            cutoff,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(raw) = cutoff {
                config.cutoff = raw
                    .parse::<DateTime<Utc>>()
                    .with_context(|| format!("invalid cutoff '{raw}'"))?;
            }

            let store = FsStore::new(&data_dir);
            let status = integrate_entry(&store, &config);
            println!("{} ({})", status.message, status.code);
            if status.code != 200 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Sources { data_dir, config } => {
            let config = load_config(config.as_deref())?;
            let store = FsStore::new(&data_dir);

            for source in loader::probe(&store, &config) {
                let rows = source
                    .rows
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".into());
                let present = if source.present { "present" } else { "absent" };
                println!(
                    "{:<8} {:<8} rows={:<8} {}",
                    source.name, present, rows, source.path
                );
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<IntegrateConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read config {}", p.display()))?;
            IntegrateConfig::from_toml(&text)
                .with_context(|| format!("failed to parse config {}", p.display()))
        }
        None => Ok(IntegrateConfig::default()),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
