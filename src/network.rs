//! Network interception bookkeeping
//!
//! Routes are registered under an alias; responses observed by the driver are
//! recorded against every alias whose route matches. Waiting on an alias consumes
//! one response at a time, in arrival order, while verifying looks at the most
//! recent response without consuming it.

use crate::error::{BrowserError, Result};
use headless_chrome::util::Wait;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Interval between polls of the registry while waiting on an alias
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A response observed for an intercepted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedResponse {
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub status_message: String,
}

impl fmt::Display for InterceptedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {} {}", self.method, self.url, self.status_code, self.status_message)
    }
}

/// An interception rule: HTTP method plus URL glob
#[derive(Debug, Clone)]
pub struct Route {
    pub method: String,
    pub url_pattern: String,
    pub alias: String,
    matcher: Regex,
}

impl Route {
    /// Build a route. `method` is case-insensitive; `*` matches any method.
    pub fn new(method: &str, url_pattern: impl Into<String>, alias: impl Into<String>) -> Result<Self> {
        let url_pattern = url_pattern.into();
        let alias = alias.into();

        if alias.trim().is_empty() {
            return Err(BrowserError::InvalidPattern("alias must not be empty".to_string()));
        }
        if url_pattern.is_empty() {
            return Err(BrowserError::InvalidPattern("URL pattern must not be empty".to_string()));
        }

        let matcher = glob_to_regex(&url_pattern)?;

        Ok(Self { method: method.trim().to_ascii_uppercase(), url_pattern, alias, matcher })
    }

    /// Whether a request with this method and URL falls under the route
    pub fn matches(&self, method: &str, url: &str) -> bool {
        if self.method != "*" && !self.method.eq_ignore_ascii_case(method) {
            return false;
        }

        if self.matcher.is_match(url) {
            return true;
        }

        if let Some(path) = path_and_query(url) {
            if self.matcher.is_match(&path) {
                return true;
            }
        }

        !has_wildcards(&self.url_pattern) && url.ends_with(self.url_pattern.as_str())
    }
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Translate a URL glob into an anchored regex: `*` is any run of characters, `?` one character
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');

    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }

    source.push('$');

    Regex::new(&source).map_err(|e| BrowserError::InvalidPattern(format!("{}: {}", pattern, e)))
}

fn path_and_query(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut out = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

#[derive(Debug)]
struct AliasState {
    route: Route,
    responses: Vec<InterceptedResponse>,
    waited: usize,
}

/// Registered routes and the responses captured for them, keyed by alias
#[derive(Debug, Default)]
pub struct InterceptRegistry {
    aliases: Mutex<IndexMap<String, AliasState>>,
}

impl InterceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, AliasState>> {
        self.aliases.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a route; re-registering an alias replaces its route and drops captured responses
    pub fn register(&self, route: Route) {
        let alias = route.alias.clone();
        self.lock().insert(alias, AliasState { route, responses: Vec::new(), waited: 0 });
    }

    /// Forget every alias and its captured responses
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_registered(&self, alias: &str) -> bool {
        self.lock().contains_key(alias)
    }

    /// Registered aliases, in registration order
    pub fn aliases(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Record an observed response against every matching route; returns how many matched
    pub fn record(&self, response: InterceptedResponse) -> usize {
        let mut aliases = self.lock();
        let mut matched = 0;

        for state in aliases.values_mut() {
            if state.route.matches(&response.method, &response.url) {
                log::debug!("Captured {} for @{}", response, state.route.alias);
                state.responses.push(response.clone());
                matched += 1;
            }
        }

        matched
    }

    /// Take the oldest response that has not been waited on yet
    pub fn next_unwaited(&self, alias: &str) -> Result<Option<InterceptedResponse>> {
        let mut aliases = self.lock();
        let state = aliases.get_mut(alias).ok_or_else(|| BrowserError::UnknownAlias(alias.to_string()))?;

        match state.responses.get(state.waited).cloned() {
            Some(response) => {
                state.waited += 1;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }

    /// The most recent response for the alias, without consuming it
    pub fn latest(&self, alias: &str) -> Result<Option<InterceptedResponse>> {
        let aliases = self.lock();
        let state = aliases.get(alias).ok_or_else(|| BrowserError::UnknownAlias(alias.to_string()))?;
        Ok(state.responses.last().cloned())
    }

    /// Number of responses captured for the alias
    pub fn captured_count(&self, alias: &str) -> Result<usize> {
        let aliases = self.lock();
        let state = aliases.get(alias).ok_or_else(|| BrowserError::UnknownAlias(alias.to_string()))?;
        Ok(state.responses.len())
    }

    /// Block until a not-yet-waited response arrives for `alias`
    pub fn wait_for(&self, alias: &str, timeout: Duration) -> Result<InterceptedResponse> {
        if !self.is_registered(alias) {
            return Err(BrowserError::UnknownAlias(alias.to_string()));
        }

        Wait::new(timeout, POLL_INTERVAL)
            .until(|| self.next_unwaited(alias).ok().flatten())
            .map_err(|_| BrowserError::ResponseTimeout { alias: alias.to_string(), timeout_ms: timeout.as_millis() as u64 })
    }
}
