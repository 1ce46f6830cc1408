//! Settings command - Show or change stored settings.

use anyhow::{Context, Result};
use clap::Args;

use tabrest_core::SettingsPatch;

use crate::OutputFormat;
use crate::commands::open_offline;
use crate::config::CliConfig;

/// Arguments for the settings command.
#[derive(Args)]
pub struct SettingsArgs {
    /// Change a setting (e.g. suspensionTimeout=15)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Add a domain to the whitelist
    #[arg(long, value_name = "DOMAIN")]
    pub whitelist: Vec<String>,

    /// Remove a domain from the whitelist
    #[arg(long, value_name = "DOMAIN")]
    pub unwhitelist: Vec<String>,
}

/// Execute the settings command.
pub fn execute(args: SettingsArgs, config: &CliConfig, format: OutputFormat) -> Result<()> {
    let suspender = open_offline(config)?;

    let patch = args
        .set
        .iter()
        .map(|assignment| {
            SettingsPatch::from_assignment(assignment)
                .with_context(|| format!("Invalid setting '{assignment}'"))
        })
        .try_fold(SettingsPatch::new(), |acc, patch| patch.map(|p| acc.merge(p)))?;

    if !patch.is_empty() {
        suspender
            .apply_settings(&patch)
            .context("Failed to save settings")?;
    }
    for domain in &args.whitelist {
        if !suspender.add_to_whitelist(domain)? {
            tracing::info!(domain = %domain, "Domain already whitelisted");
        }
    }
    for domain in &args.unwhitelist {
        if !suspender.remove_from_whitelist(domain)? {
            tracing::warn!(domain = %domain, "Domain was not whitelisted");
        }
    }

    let settings = suspender.settings();
    match format {
        OutputFormat::Human => {
            println!("Suspension timeout:        {} minutes", settings.suspension_timeout);
            println!("Restore on focus:          {}", settings.auto_unsuspend_on_focus);
            println!("Suspend pinned tabs:       {}", settings.suspend_pinned_tabs);
            println!("Never suspend audio:       {}", settings.never_suspend_audio);
            println!("Never suspend active tab:  {}", settings.never_suspend_active_tab);
            println!("Whitelist:");
            if settings.whitelisted_domains.is_empty() {
                println!("  (empty)");
            }
            for domain in &settings.whitelisted_domains {
                println!("  - {domain}");
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.render_json(&settings.to_json())?);
        }
    }

    Ok(())
}
