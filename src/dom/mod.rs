//! Element lookup and snapshots
//!
//! This module describes how elements are located and what a driver reports back
//! about them:
//! - Locator / Target: CSS selector, `data-test-id` or visible text, plus narrowing
//! - ElementNode: snapshot of a matched element (text, attributes, value, visibility)
//! - the in-page query script used by the Chrome driver

pub mod element;
pub mod locator;

pub use element::{BoundingBox, ElementNode};
pub use locator::{Locator, Pick, TEST_ID_ATTRIBUTE, Target, test_id_selector};

use crate::error::{BrowserError, Result};

/// Attribute set on the element an action is about to touch
pub const MARK_ATTRIBUTE: &str = "data-pom-ref";

/// Build the JavaScript expression that resolves `locator` in the page
///
/// When `mark` is given as `(index, token)`, the element at `index` is tagged with
/// `data-pom-ref="<token>"` so it can be found again by CSS for input events.
pub fn query_script(locator: &Locator, mark: Option<(usize, &str)>) -> String {
    let js = include_str!("query_elements.js");

    let (css, text) = match locator {
        Locator::Text(text) => (serde_json::Value::Null, serde_json::Value::from(text.as_str())),
        other => (
            serde_json::Value::from(other.css_selector().unwrap_or_default()),
            serde_json::Value::Null,
        ),
    };

    let (index, token) = match mark {
        Some((index, token)) => (serde_json::Value::from(index), serde_json::Value::from(token)),
        None => (serde_json::Value::Null, serde_json::Value::Null),
    };

    format!("{}({}, {}, {}, {})", js.trim_end(), css, text, index, token)
}

/// Parse the value returned by [`query_script`]
pub fn parse_query_result(value: Option<serde_json::Value>) -> Result<Vec<ElementNode>> {
    let value = value.ok_or_else(|| BrowserError::EvaluationFailed("No value returned from element query".to_string()))?;

    // The script returns a JSON string, so it is decoded twice
    let json_str: String = serde_json::from_value(value)
        .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to get JSON string: {}", e)))?;

    serde_json::from_str(&json_str)
        .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to parse element query result: {}", e)))
}
