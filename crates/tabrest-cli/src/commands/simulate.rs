//! Simulate command - Run a scenario against a simulated browser.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::OutputFormat;
use crate::config::CliConfig;
use crate::scenario::{self, Scenario};

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the scenario (TOML, or JSON with a .json extension)
    #[arg(required = true)]
    pub scenario: PathBuf,

    /// Override the suspension timeout in minutes
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Stop at this minute instead of the scenario's own end
    #[arg(long)]
    pub until: Option<u64>,
}

/// Execute the simulate command.
pub fn execute(args: SimulateArgs, config: &CliConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    let mut scenario = Scenario::from_path(&args.scenario)?;
    if let Some(minutes) = args.timeout {
        scenario.settings.suspension_timeout = Some(minutes);
    }
    if args.until.is_some() {
        scenario.until = args.until;
    }

    tracing::info!(
        scenario = %args.scenario.display(),
        events = scenario.events.len(),
        "Running scenario"
    );

    let report = scenario::run(&scenario, config.base_settings()?)
        .with_context(|| format!("Scenario {} failed", args.scenario.display()))?;

    match format {
        OutputFormat::Human => {
            if quiet {
                print!("{}", report.stats.to_text());
            } else {
                print!("{}", report.to_text());
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.render_json(&report.to_json())?);
        }
    }

    Ok(())
}
