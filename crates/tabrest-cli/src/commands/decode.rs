//! Decode command - Decode a suspended page URL.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use tabrest_core::{Clock, SuspendedPage, SystemClock, display_domain};

use crate::OutputFormat;
use crate::commands::stats::local_time;

/// Arguments for the decode command.
#[derive(Args)]
pub struct DecodeArgs {
    /// The placeholder URL
    #[arg(required = true)]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeOutput {
    #[serde(flatten)]
    page: SuspendedPage,
    domain: String,
    elapsed: String,
}

/// Execute the decode command.
pub fn execute(args: DecodeArgs, format: OutputFormat) -> Result<()> {
    let now = SystemClock.now();
    let page = SuspendedPage::decode(&args.url, now).context("Not a suspended page URL")?;

    let output = DecodeOutput {
        domain: display_domain(Some(&args.url)),
        elapsed: page.elapsed_label(now),
        page,
    };

    match format {
        OutputFormat::Human => {
            println!("Title:     {}", output.page.title);
            println!("Domain:    {}", output.domain);
            match &output.page.original_url {
                Some(url) => println!("URL:       {url}"),
                None => println!("URL:       (missing, tab cannot be restored)"),
            }
            if !output.page.favicon.is_empty() {
                println!("Favicon:   {}", output.page.favicon);
            }
            println!(
                "Suspended: {} ({})",
                local_time(output.page.suspended_at),
                output.elapsed
            );
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.render_json(&output)?);
        }
    }

    Ok(())
}
