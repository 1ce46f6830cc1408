//! Stats command - Show stored memory statistics.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::Args;
use serde::Serialize;

use tabrest_observe::{HistoryEntry, format_bytes};

use crate::OutputFormat;
use crate::commands::open_offline;
use crate::config::CliConfig;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Number of recent suspensions to list
    #[arg(long, default_value = "10")]
    pub history: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    total_saved: u64,
    today_saved: u64,
    tabs_suspended: u64,
    install_date: Option<i64>,
    recent: Vec<HistoryEntry>,
}

/// Execute the stats command.
pub fn execute(args: StatsArgs, config: &CliConfig, format: OutputFormat) -> Result<()> {
    let suspender = open_offline(config)?;
    let stats = suspender
        .memory_stats()
        .context("Failed to read memory statistics")?;

    let output = StatsOutput {
        total_saved: stats.total_saved,
        today_saved: stats.saved_on_day_of(suspender.now()),
        tabs_suspended: stats.tabs_suspended,
        install_date: suspender.install_date()?,
        recent: stats.history.iter().rev().take(args.history).cloned().collect(),
    };

    match format {
        OutputFormat::Human => {
            println!("Memory saved:      {}", format_bytes(output.total_saved));
            println!("Saved today:       {}", format_bytes(output.today_saved));
            println!("Lifetime suspends: {}", output.tabs_suspended);
            if let Some(installed) = output.install_date {
                println!("Installed:         {}", local_time(installed));
            }
            if !output.recent.is_empty() {
                println!("\nRecent:");
                for entry in &output.recent {
                    println!("  {}  {}", local_time(entry.timestamp), entry.url);
                }
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.render_json(&output)?);
        }
    }

    Ok(())
}

pub(crate) fn local_time(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}
