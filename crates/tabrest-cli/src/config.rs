//! CLI configuration file.
//!
//! ```toml
//! state_dir = "/home/me/.local/share/tabrest"
//!
//! [settings]
//! suspensionTimeout = 15
//! whitelistedDomains = ["mail.example.com"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use tabrest_core::{Settings, SettingsPatch};

/// Directory used for storage when no config names one.
pub const DEFAULT_STATE_DIR: &str = ".tabrest";

/// Options read from `--config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Where the JSON storage files live.
    pub state_dir: Option<PathBuf>,
    /// Settings used when storage holds none.
    pub settings: SettingsPatch,
}

impl CliConfig {
    /// Load the config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Storage directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }

    /// Default settings with the config's overrides applied.
    pub fn base_settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        settings
            .apply(&self.settings)
            .context("Invalid settings in config file")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = CliConfig::parse("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.state_dir(), PathBuf::from(DEFAULT_STATE_DIR));
        assert_eq!(config.base_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_settings_overrides() {
        let config = CliConfig::parse(
            r#"
            state_dir = "/tmp/tabrest"

            [settings]
            suspensionTimeout = 15
            neverSuspendAudio = false
            "#,
        )
        .unwrap();

        assert_eq!(config.state_dir(), PathBuf::from("/tmp/tabrest"));
        let settings = config.base_settings().unwrap();
        assert_eq!(settings.suspension_timeout, 15);
        assert!(!settings.never_suspend_audio);
        assert!(settings.never_suspend_active_tab);
    }

    #[test]
    fn test_invalid_config() {
        assert!(CliConfig::parse("unknown = 1").is_err());

        let config = CliConfig::parse("[settings]\nsuspensionTimeout = 0").unwrap();
        assert!(config.base_settings().is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }
}
