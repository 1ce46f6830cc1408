//! Tabrest CLI - Command-line interface for the Tabrest tab suspender.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod scenario;

/// Tabrest idle tab suspender
#[derive(Parser)]
#[command(name = "tabrest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Output format options.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl OutputFormat {
    /// Render a serializable value as JSON in this format.
    pub fn render_json<T: serde::Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::JsonCompact => serde_json::to_string(value),
            _ => serde_json::to_string_pretty(value),
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario against a simulated browser
    Simulate(commands::simulate::SimulateArgs),
    /// Show or change stored settings
    Settings(commands::settings::SettingsArgs),
    /// Show stored memory statistics
    Stats(commands::stats::StatsArgs),
    /// Decode a suspended page URL
    Decode(commands::decode::DecodeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabrest={log_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = config::CliConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Simulate(args) => commands::simulate::execute(args, &config, cli.format, cli.quiet),
        Commands::Settings(args) => commands::settings::execute(args, &config, cli.format),
        Commands::Stats(args) => commands::stats::execute(args, &config, cli.format),
        Commands::Decode(args) => commands::decode::execute(args, cli.format),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
