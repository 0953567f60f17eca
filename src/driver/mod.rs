//! The automation driver seam
//!
//! Helpers never talk to the browser directly; they go through a [`Driver`]. The
//! trait is split into probes that report the current state once (`query`,
//! `current_url`, `title`) and actions that wait for their target to resolve
//! before acting (`click`, `clear_and_type`, `select`). Assertions built on the
//! probes are polled by [`crate::assertion::should`].

pub mod chrome;

pub use chrome::ChromeDriver;

use crate::config::TestConfig;
use crate::dom::{ElementNode, Locator, Pick, Target};
use crate::error::{BrowserError, Result};
use crate::network::InterceptRegistry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long retrying commands keep trying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Element lookups, actions and assertions
    pub command: Duration,
    /// Waiting on an intercepted response
    pub response: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { command: Duration::from_millis(5000), response: Duration::from_millis(30_000) }
    }
}

impl Timeouts {
    pub fn from_config(config: &TestConfig) -> Self {
        Self { command: config.command_timeout(), response: config.response_timeout() }
    }
}

/// Which option of a dropdown to select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum SelectOption {
    /// Visible option text
    Text(String),
    /// Option `value` attribute
    Value(String),
}

impl SelectOption {
    pub fn label(&self) -> &str {
        match self {
            SelectOption::Text(s) | SelectOption::Value(s) => s,
        }
    }
}

/// Browser automation primitives used by [`crate::Utils`]
pub trait Driver {
    /// Delete every cookie of the browser
    fn clear_cookies(&self) -> Result<()>;

    /// Clear `localStorage` of the current origin
    fn clear_local_storage(&self) -> Result<()>;

    /// Clear `sessionStorage` of the current origin
    fn clear_session_storage(&self) -> Result<()>;

    /// Navigate to an absolute URL and wait for the load to finish
    fn visit(&self, url: &str) -> Result<()>;

    /// Resolve a locator against the live DOM, once, without waiting
    fn query(&self, locator: &Locator) -> Result<Vec<ElementNode>>;

    /// Click the single element the target resolves to
    fn click(&self, target: &Target) -> Result<()>;

    /// Clear the element's current content and type `text` into it
    fn clear_and_type(&self, target: &Target, text: &str) -> Result<()>;

    /// Select a dropdown option; returns the `value` of the selected option
    fn select(&self, target: &Target, option: &SelectOption) -> Result<String>;

    fn current_url(&self) -> Result<String>;

    fn title(&self) -> Result<String>;

    /// Routes and captured responses for network interception
    fn intercepts(&self) -> &InterceptRegistry;

    /// Start feeding observed responses into [`Driver::intercepts`]; idempotent
    fn start_intercepting(&self) -> Result<()>;

    /// Drain the exceptions thrown by the page since the last call
    fn take_uncaught_exceptions(&self) -> Result<Vec<String>>;

    /// PNG screenshot of the current viewport
    fn screenshot(&self) -> Result<Vec<u8>>;

    fn timeouts(&self) -> Timeouts;

    /// Suspend for a fixed duration
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Resolve a target, applying its narrowing
    fn resolve(&self, target: &Target) -> Result<Vec<ElementNode>> {
        Ok(target.pick.apply(self.query(&target.locator)?))
    }
}

/// Index of the element an action should use, given `count` matches of the locator
///
/// `Ok(None)` means nothing usable matched yet and the caller should keep waiting.
pub fn action_index(target: &Target, count: usize) -> Result<Option<usize>> {
    let index = match target.pick {
        Pick::All if count > 1 => {
            return Err(BrowserError::MultipleElements { selector: target.locator.to_string(), count });
        }
        Pick::All | Pick::First => 0,
        Pick::Last => count.saturating_sub(1),
        Pick::Nth(i) => i,
    };

    Ok((index < count).then_some(index))
}
