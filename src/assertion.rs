//! Retrying assertions
//!
//! An [`Expectation`] is evaluated against a driver's probes. [`should`] keeps
//! re-evaluating it until it is met or the timeout elapses, then reports the
//! last observed state.

use crate::dom::{ElementNode, Target};
use crate::driver::Driver;
use crate::error::{BrowserError, Result};
use crate::network::POLL_INTERVAL;
use headless_chrome::util::Wait;
use std::time::Duration;

/// A condition on the page, the URL, or an intercepted response
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    UrlContains(String),
    UrlEquals(String),
    TitleEquals(String),
    /// At least one element, and every element in the set is visible
    Visible(Target),
    /// At least one element, and none of them is visible
    NotVisible(Target),
    Exists(Target),
    NotExists(Target),
    /// Some element's text contains the string
    ContainsText(Target, String),
    /// The first element's attribute equals the value
    AttributeEquals { target: Target, name: String, value: String },
    /// The first element's form value equals the value
    ValueEquals(Target, String),
    /// The latest response captured for the alias has this status
    ResponseStatus { alias: String, status_code: Option<u16>, status_message: Option<String> },
}

/// Outcome of a single evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub met: bool,
    /// What was observed, for failure messages
    pub actual: String,
}

impl Check {
    fn new(met: bool, actual: impl Into<String>) -> Self {
        Self { met, actual: actual.into() }
    }
}

fn count_phrase(n: usize) -> String {
    match n {
        0 => "found no elements".to_string(),
        1 => "found 1 element".to_string(),
        n => format!("found {} elements", n),
    }
}

impl Expectation {
    /// Human-readable form of the expectation, used as the "expected" half of a failure
    pub fn describe(&self) -> String {
        match self {
            Expectation::UrlContains(s) => format!("url to include '{}'", s),
            Expectation::UrlEquals(s) => format!("url to equal '{}'", s),
            Expectation::TitleEquals(s) => format!("title to equal '{}'", s),
            Expectation::Visible(t) => format!("{} to be visible", t),
            Expectation::NotVisible(t) => format!("{} not to be visible", t),
            Expectation::Exists(t) => format!("{} to exist in the DOM", t),
            Expectation::NotExists(t) => format!("{} not to exist in the DOM", t),
            Expectation::ContainsText(t, s) => format!("{} to contain '{}'", t, s),
            Expectation::AttributeEquals { target, name, value } => {
                format!("{} to have attribute '{}' with value '{}'", target, name, value)
            }
            Expectation::ValueEquals(t, s) => format!("{} to have value '{}'", t, s),
            Expectation::ResponseStatus { alias, status_code, status_message } => {
                let mut parts = Vec::new();
                if let Some(code) = status_code {
                    parts.push(format!("status code {}", code));
                }
                if let Some(message) = status_message {
                    parts.push(format!("status message '{}'", message));
                }
                format!("response of @{} to have {}", alias, parts.join(" and "))
            }
        }
    }

    /// Evaluate once against the current state
    pub fn evaluate<D: Driver + ?Sized>(&self, driver: &D) -> Result<Check> {
        let check = match self {
            Expectation::UrlContains(s) => {
                let url = driver.current_url()?;
                Check::new(url.contains(s.as_str()), format!("url was '{}'", url))
            }
            Expectation::UrlEquals(s) => {
                let url = driver.current_url()?;
                Check::new(url == *s, format!("url was '{}'", url))
            }
            Expectation::TitleEquals(s) => {
                let title = driver.title()?;
                Check::new(title == *s, format!("title was '{}'", title))
            }
            Expectation::Visible(t) => {
                let nodes = driver.resolve(t)?;
                let hidden: Vec<&ElementNode> = nodes.iter().filter(|n| !n.is_visible).collect();
                match (nodes.len(), hidden.first()) {
                    (0, _) => Check::new(false, count_phrase(0)),
                    (_, None) => Check::new(true, count_phrase(nodes.len())),
                    (n, Some(first)) => Check::new(false, format!("{} of {} hidden, e.g. {}", hidden.len(), n, first.describe())),
                }
            }
            Expectation::NotVisible(t) => {
                let nodes = driver.resolve(t)?;
                match nodes.iter().find(|n| n.is_visible) {
                    _ if nodes.is_empty() => Check::new(false, count_phrase(0)),
                    Some(visible) => Check::new(false, format!("{} is visible", visible.describe())),
                    None => Check::new(true, count_phrase(nodes.len())),
                }
            }
            Expectation::Exists(t) => {
                let n = driver.resolve(t)?.len();
                Check::new(n > 0, count_phrase(n))
            }
            Expectation::NotExists(t) => {
                let n = driver.resolve(t)?.len();
                Check::new(n == 0, count_phrase(n))
            }
            Expectation::ContainsText(t, s) => {
                let nodes = driver.resolve(t)?;
                let met = nodes.iter().any(|n| n.text_content.contains(s.as_str()));
                let actual = match nodes.first() {
                    None => count_phrase(0),
                    Some(first) => format!("text was '{}'", first.text_content),
                };
                Check::new(met, actual)
            }
            Expectation::AttributeEquals { target, name, value } => match driver.resolve(target)?.first() {
                None => Check::new(false, count_phrase(0)),
                Some(node) => match node.get_attribute(name) {
                    Some(actual) => Check::new(actual == value, format!("'{}' was '{}'", name, actual)),
                    None => Check::new(false, format!("{} has no attribute '{}'", node.describe(), name)),
                },
            },
            Expectation::ValueEquals(t, s) => match driver.resolve(t)?.first() {
                None => Check::new(false, count_phrase(0)),
                Some(node) => {
                    let value = node.value.clone().unwrap_or_default();
                    Check::new(value == *s, format!("value was '{}'", value))
                }
            },
            Expectation::ResponseStatus { alias, status_code, status_message } => {
                match driver.intercepts().latest(alias)? {
                    None => Check::new(false, format!("no response captured for @{}", alias)),
                    Some(response) => {
                        let code_ok = status_code.is_none_or(|c| c == response.status_code);
                        let message_ok = status_message.as_deref().is_none_or(|m| m == response.status_message);
                        Check::new(
                            code_ok && message_ok,
                            format!("response was {} '{}'", response.status_code, response.status_message),
                        )
                    }
                }
            }
        };

        Ok(check)
    }
}

/// Re-evaluate `expectation` until it holds or `timeout` elapses
///
/// Probe errors count as "not yet" and are retried, except for an unknown alias,
/// which can never resolve and is returned immediately.
pub fn should<D: Driver + ?Sized>(driver: &D, expectation: &Expectation, timeout: Duration) -> Result<()> {
    let mut last_seen = String::from("nothing was observed");

    let outcome = Wait::new(timeout, POLL_INTERVAL).until(|| match expectation.evaluate(driver) {
        Ok(check) if check.met => Some(Ok(())),
        Ok(check) => {
            last_seen = check.actual;
            None
        }
        Err(e @ BrowserError::UnknownAlias(_)) => Some(Err(e)),
        Err(e) => {
            last_seen = e.to_string();
            None
        }
    });

    match outcome {
        Ok(result) => result,
        Err(_) => Err(BrowserError::AssertionFailed {
            expected: expectation.describe(),
            actual: last_seen,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Resolve a target, retrying until at least one element matches
pub fn resolve_with_retry<D: Driver + ?Sized>(driver: &D, target: &Target, timeout: Duration) -> Result<Vec<ElementNode>> {
    let mut last_seen = count_phrase(0);

    let outcome = Wait::new(timeout, POLL_INTERVAL).until(|| match driver.resolve(target) {
        Ok(nodes) if !nodes.is_empty() => Some(nodes),
        Ok(_) => None,
        Err(e) => {
            last_seen = e.to_string();
            None
        }
    });

    outcome.map_err(|_| BrowserError::AssertionFailed {
        expected: format!("to find {}", target),
        actual: last_seen,
        timeout_ms: timeout.as_millis() as u64,
    })
}
