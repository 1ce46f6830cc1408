//! CLI subcommands.

pub mod decode;
pub mod settings;
pub mod simulate;
pub mod stats;

use std::sync::Arc;

use anyhow::{Context, Result};

use tabrest::Suspender;
use tabrest_host::{JsonFileStore, MemoryTabHost};

use crate::config::CliConfig;

/// A suspender over the on-disk store, with no live browser attached.
pub(crate) fn open_offline(config: &CliConfig) -> Result<Suspender<MemoryTabHost, JsonFileStore>> {
    let dir = config.state_dir();
    let store = JsonFileStore::open(&dir)
        .with_context(|| format!("Failed to open state directory {}", dir.display()))?;

    let suspender = Suspender::builder(Arc::new(MemoryTabHost::default()), Arc::new(store))
        .with_settings(config.base_settings()?)
        .build()
        .context("Failed to create suspender")?;
    suspender.load_settings();
    Ok(suspender)
}
