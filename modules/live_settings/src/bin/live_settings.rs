//! Command line tool for the live settings tables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use live_settings::{Config, LiveSettingsModule};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "live-settings", version, about = "Manage live settings storage")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or upgrade the settings tables
    Migrate,
    /// Print every stored value as an `overrides:` YAML document
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_line_number(true).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = Config::load(cli.config.as_deref())?;
    let url = config
        .database_url
        .clone()
        .context("database_url is not configured")?;

    let module = LiveSettingsModule::default();
    match cli.command {
        Command::Migrate => {
            let conn = live_settings::module::connect(&url).await?;
            module.migrate(&conn).await?;
        }
        Command::Export { output } => {
            let service = module.init(config).await?;
            let yaml = service.to_yaml().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, yaml)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Exported settings");
                }
                None => print!("{}", yaml),
            }
        }
    }
    Ok(())
}
