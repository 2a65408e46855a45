//! Server configuration file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use bca_auth::FrontchannelConfig;
use bca_core::BackchannelConfig;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/bca.toml";

/// Top-level server configuration.
///
/// ```toml
/// bind = "0.0.0.0:8100"
/// sweep_interval_secs = 60
///
/// [backchannel]
/// delay_secs = 5
/// rejecting_subject = "mallory"
///
/// [frontchannel]
/// username = "alice"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: String,
    /// Seconds between expiry sweeps, used only with a request TTL.
    pub sweep_interval_secs: u64,
    /// Backchannel policy.
    pub backchannel: BackchannelConfig,
    /// Auto-login settings.
    pub frontchannel: FrontchannelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8100".to_string(),
            sweep_interval_secs: 60,
            backchannel: BackchannelConfig::default(),
            frontchannel: FrontchannelConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration file")
    }

    /// Loads the configuration file at `path`.
    ///
    /// When `required` is false a missing file yields the defaults.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                bail!("Configuration file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Validates the merged configuration.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs == 0 {
            bail!("sweep_interval_secs must be > 0");
        }
        self.backchannel.validate()?;
        self.frontchannel.validate()?;
        Ok(())
    }
}
