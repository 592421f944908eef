//! Configuration loading and validation for `flag-admin`.
//!
//! All values are read from environment variables at startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated operator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding one `<challenge_id>.key` file per challenge.
    #[serde(default = "default_keystore_dir")]
    pub keystore_dir: PathBuf,

    /// Text in front of the braces of every flag.
    #[serde(default = "default_flag_prefix")]
    pub flag_prefix: String,

    /// Flags issued at or before this Unix time (seconds) are stale.
    #[serde(default)]
    pub flag_valid_start: u64,

    /// Flags issued after this Unix time (seconds) are rejected.
    #[serde(default = "default_flag_valid_end")]
    pub flag_valid_end: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_keystore_dir() -> PathBuf {
    "/etc/flags/keystore".into()
}
fn default_flag_prefix() -> String {
    common::protocol::DEFAULT_PREFIX.into()
}
fn default_flag_valid_end() -> u64 {
    u64::MAX / MICROS_PER_SEC
}
fn default_log_level() -> String {
    "info".into()
}

const MICROS_PER_SEC: u64 = 1_000_000;

/// Half-open issuance window `(start, end]` in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    pub start_us: u64,
    pub end_us: u64,
}

impl FreshnessWindow {
    pub fn from_secs(start: u64, end: u64) -> Self {
        Self {
            start_us: start.saturating_mul(MICROS_PER_SEC),
            end_us: end.saturating_mul(MICROS_PER_SEC),
        }
    }

    pub fn contains(&self, time_us: u64) -> bool {
        self.start_us < time_us && time_us <= self.end_us
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build flag-admin configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise flag-admin configuration")?;

        c.validate()?;
        Ok(c)
    }

    pub fn window(&self) -> FreshnessWindow {
        FreshnessWindow::from_secs(self.flag_valid_start, self.flag_valid_end)
    }

    fn validate(&self) -> Result<()> {
        if self.keystore_dir.as_os_str().is_empty() {
            anyhow::bail!("KEYSTORE_DIR must not be empty");
        }
        if self.flag_prefix.is_empty()
            || !self
                .flag_prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            anyhow::bail!("FLAG_PREFIX must be non-empty and match [A-Za-z0-9_]+");
        }
        if self.flag_valid_start >= self.flag_valid_end {
            anyhow::bail!("FLAG_VALID_START must be earlier than FLAG_VALID_END");
        }
        Ok(())
    }
}
