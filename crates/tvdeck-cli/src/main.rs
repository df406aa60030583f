//! tvdeck CLI - Headless runner for the tvdeck core
//!
//! Features:
//! - Key scripts replayed on a virtual clock (deterministic)
//! - Interactive mode reading remote keys from stdin in real time
//! - Effective configuration dump
//! - Remote key table

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use output::OutputFormat;

/// tvdeck CLI - Remote-driven media browser, without a screen
#[derive(Parser)]
#[command(name = "tvdeck")]
#[command(version)]
#[command(about = "Drive the tvdeck playback and focus engine from a terminal", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend override (native, media_element, adaptive)
    #[arg(short, long, global = true)]
    backend: Option<String>,

    /// Folder to list titles from, instead of the demo titles
    #[arg(short, long, global = true)]
    media_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a key script on the virtual clock
    Run {
        /// Script file, one step per line
        #[arg(short, long, conflicts_with = "steps")]
        script: Option<PathBuf>,

        /// Inline steps separated by commas, e.g. "down,enter,wait 2000,state"
        #[arg(short = 'k', long)]
        steps: Option<String>,
    },

    /// Read keys from stdin and run in real time
    Interactive {
        /// Frame interval in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },

    /// Print the effective configuration
    Config,

    /// List the remote keys and their codes
    Keys,
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);
    tvdeck_core::init();

    let config = commands::load_config(
        cli.config.as_deref(),
        cli.backend.as_deref(),
        cli.media_dir,
    )?;

    match cli.command {
        Commands::Run { script, steps } => {
            let source = match (script, steps) {
                (Some(path), _) => std::fs::read_to_string(path)?,
                (None, Some(steps)) => steps,
                (None, None) => anyhow::bail!("either --script or --steps is required"),
            };
            commands::run_script(config, &source, cli.format).await?;
        }
        Commands::Interactive { frame_ms } => {
            commands::interactive(config, frame_ms, cli.format).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Keys => {
            println!("{}", output::key_table());
        }
    }

    Ok(())
}
