//! Run-wide test configuration
//!
//! A [`TestConfig`] is built once when a run starts (usually from a TOML file) and
//! shared with every page object through [`crate::Utils`]. The defaults mirror a
//! conventional setup: two retries in run mode, a 1920x1080 viewport, five second
//! command timeout and an `admin`/`admin` credential pair.

use crate::error::{BrowserError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options for the generated run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterOptions {
    /// Include pass/fail totals for charting
    pub charts: bool,
    pub report_page_title: String,
    /// Embed failure screenshots as base64 instead of linking files
    pub embedded_screenshots: bool,
    /// Keep every attempt of a retried test, not just the last one
    pub save_all_attempts: bool,
    pub report_dir: PathBuf,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            charts: true,
            report_page_title: "Automation Test Report".to_string(),
            embedded_screenshots: true,
            save_all_attempts: false,
            report_dir: PathBuf::from("reports"),
        }
    }
}

/// Whole-test retries per execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Retries {
    /// Headless/CI runs
    pub run_mode: u32,
    /// Interactive runs
    pub open_mode: u32,
}

impl Default for Retries {
    fn default() -> Self {
        Self { run_mode: 2, open_mode: 1 }
    }
}

/// What to do with exceptions thrown by the page under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExceptionPolicy {
    /// Fail the test, unless the message contains one of the `ignore` fragments
    Fail {
        #[serde(default)]
        ignore: Vec<String>,
    },
    /// Never fail a test because of a page exception
    IgnoreAll,
}

impl Default for ExceptionPolicy {
    fn default() -> Self {
        ExceptionPolicy::Fail { ignore: Vec::new() }
    }
}

impl ExceptionPolicy {
    /// Policy that only tolerates exceptions whose message contains one of `fragments`
    pub fn ignoring<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExceptionPolicy::Fail { ignore: fragments.into_iter().map(Into::into).collect() }
    }

    /// Whether an uncaught exception with this message should fail the test
    pub fn fails_on(&self, message: &str) -> bool {
        match self {
            ExceptionPolicy::IgnoreAll => false,
            ExceptionPolicy::Fail { ignore } => !ignore.iter().any(|fragment| message.contains(fragment.as_str())),
        }
    }
}

/// Environment bag consumed by page objects for URL assembly and login flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvBag {
    pub base_url: String,
    pub admin_user: String,
    pub admin_pass: String,
    /// Any other keys from the `[env]` table
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for EnvBag {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            admin_user: "admin".to_string(),
            admin_pass: "admin".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl EnvBag {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "base_url" => Some(&self.base_url),
            "admin_user" => Some(&self.admin_user),
            "admin_pass" => Some(&self.admin_pass),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}

/// Configuration shared by the driver, the helpers and the runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub reporter: ReporterOptions,
    pub retries: Retries,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Video capture; not supported by the Chrome driver
    pub video: bool,
    /// How long element and URL assertions keep retrying
    pub default_command_timeout_ms: u64,
    /// How long alias waits block for a response
    pub response_timeout_ms: u64,
    /// Clear browser storage before every test
    pub test_isolation: bool,
    pub uncaught_exceptions: ExceptionPolicy,
    pub env: EnvBag,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            reporter: ReporterOptions::default(),
            retries: Retries::default(),
            viewport_width: 1920,
            viewport_height: 1080,
            video: false,
            default_command_timeout_ms: 5000,
            response_timeout_ms: 30_000,
            test_isolation: false,
            uncaught_exceptions: ExceptionPolicy::default(),
            env: EnvBag::default(),
        }
    }
}

impl TestConfig {
    /// Parse a configuration from TOML, filling unset keys with defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: TestConfig = toml::from_str(source).map_err(|e| BrowserError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| BrowserError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(BrowserError::Config("viewport dimensions must be non-zero".to_string()));
        }
        if self.default_command_timeout_ms == 0 {
            return Err(BrowserError::Config("default_command_timeout_ms must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.env.base_url = base_url.into();
        self
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.default_command_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Number of retries for the given mode
    pub fn retries_for(&self, mode: RunMode) -> u32 {
        match mode {
            RunMode::Run => self.retries.run_mode,
            RunMode::Open => self.retries.open_mode,
        }
    }
}

/// Execution mode, selecting the retry count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Run,
    Open,
}
