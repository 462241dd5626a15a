use crate::error::{Result, VendError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Controller settings. Every field has a default, so an absent or empty file
/// yields the stock configuration. Credentials are never read from here; they
/// come from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long a slot's relays stay energized.
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
    /// Upper bound on handling one order: the order fetch and every line item
    /// resolution share this deadline. Dispense cycles are not counted.
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,
    /// Forget claimed orders after this long. Unset keeps them forever.
    #[serde(default)]
    pub ledger_retention_secs: Option<u64>,
    #[serde(default)]
    pub square: SquareSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SquareSettings {
    /// Overrides the production API origin.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Overrides the pinned `Square-Version` header.
    #[serde(default)]
    pub version: Option<String>,
    /// Public URL Square posts to; required for signature verification.
    #[serde(default)]
    pub notification_url: Option<String>,
}

fn default_port() -> u16 {
    8000
}

fn default_dwell_ms() -> u64 {
    3300
}

fn default_resolve_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            dwell_ms: default_dwell_ms(),
            resolve_timeout_secs: default_resolve_timeout_secs(),
            ledger_retention_secs: None,
            square: SquareSettings::default(),
        }
    }
}

impl Config {
    /// Load from a YAML file. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: Config = if data.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&data)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dwell_ms == 0 {
            return Err(VendError::InvalidConfig("dwell_ms must be positive".into()));
        }
        if self.resolve_timeout_secs == 0 {
            return Err(VendError::InvalidConfig(
                "resolve_timeout_secs must be positive".into(),
            ));
        }
        if self.ledger_retention_secs == Some(0) {
            return Err(VendError::InvalidConfig(
                "ledger_retention_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn ledger_retention(&self) -> Option<Duration> {
        self.ledger_retention_secs.map(Duration::from_secs)
    }
}
