use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ghost_infra::AppConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::print::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the deployment configuration
    #[arg(
        long,
        global = true,
        env = "GHOST_INFRA_CONFIG",
        default_value = "config.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize all stacks into a cloud assembly directory
    Synth {
        /// Output directory
        #[arg(long, short, default_value = "cdk.out")]
        out: PathBuf,
    },
    /// List the stacks the configuration produces
    #[command(visible_alias = "ls")]
    List,
    /// Print the template of one stack
    Print {
        /// Stack name
        stack: String,
        /// Output format
        #[arg(long, short, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Check the configuration for errors and unused options
    CheckConfig,
}

fn main() -> Result<()> {
    // Logs go to stderr so `print` output can be piped
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        // check-config reports load errors itself
        Commands::CheckConfig => cli::check::handle_check_config(&cli.config)?,
        Commands::Synth { out } => cli::synth::handle_synth(&load_config(&cli.config)?, out)?,
        Commands::List => cli::list::handle_list(&load_config(&cli.config)?)?,
        Commands::Print { stack, format } => {
            cli::print::handle_print(&load_config(&cli.config)?, stack, *format)?
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}
