use crate::cryptography::dleq::DEFAULT_NONCE_ATTEMPTS;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ALERT_WINDOW_SECS: u64 = 1800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    InvalidConfig(#[from] serde_yml::Error),
    #[error("The grace period must be longer than zero seconds.")]
    ZeroGracePeriod,
    #[error("At least one nonce attempt must be allowed.")]
    ZeroNonceAttempts,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Deployment-time parameters of a swap lock.
///
/// The grace period is deliberately not defaulted. It decides how long the depositor has to act on a revealed secret
/// before the unlocker can claim, and must be chosen for the counterparty chain's confirmation times.
///
/// ```yaml
/// grace_period_secs: 7200
/// nonce_attempts: 100       # optional
/// alert_window_secs: 1800   # optional
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    grace_period_secs: u64,
    #[serde(default = "default_nonce_attempts")]
    nonce_attempts: u32,
    #[serde(default = "default_alert_window")]
    alert_window_secs: u64,
}

fn default_nonce_attempts() -> u32 {
    DEFAULT_NONCE_ATTEMPTS
}

fn default_alert_window() -> u64 {
    DEFAULT_ALERT_WINDOW_SECS
}

impl SwapConfig {
    pub fn new(grace_period: Duration) -> Self {
        SwapConfig {
            grace_period_secs: grace_period.as_secs(),
            nonce_attempts: DEFAULT_NONCE_ATTEMPTS,
            alert_window_secs: DEFAULT_ALERT_WINDOW_SECS,
        }
    }

    pub fn with_nonce_attempts(mut self, attempts: u32) -> Self {
        self.nonce_attempts = attempts;
        self
    }

    pub fn with_alert_window(mut self, window: Duration) -> Self {
        self.alert_window_secs = window.as_secs();
        self
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn nonce_attempts(&self) -> u32 {
        self.nonce_attempts
    }

    /// How long before `claimable_after` a watching depositor is warned.
    pub fn alert_window(&self) -> Duration {
        Duration::from_secs(self.alert_window_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_period_secs == 0 {
            return Err(ConfigError::ZeroGracePeriod);
        }
        if self.nonce_attempts == 0 {
            return Err(ConfigError::ZeroNonceAttempts);
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SwapConfig = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: SwapConfig = serde_yml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_yml::to_writer(writer, self)?;
        Ok(())
    }
}
