//! Logged interaction and assertion helpers
//!
//! [`Utils`] wraps a [`Driver`] with a fixed vocabulary of named helpers. Each
//! helper performs one driver call (or one retrying assertion) and writes one or
//! two lines to the [`CommandLog`], so a failed run reads as a list of what the
//! test did up to the failure. Page objects hold a `&Utils` and never touch the
//! driver directly.

use crate::assertion::{self, Expectation};
use crate::command_log::{CommandLog, LogKind};
use crate::config::TestConfig;
use crate::dom::{ElementNode, Target};
use crate::driver::{Driver, SelectOption, action_index};
use crate::error::{BrowserError, Result};
use crate::network::{InterceptedResponse, Route};
use std::sync::Arc;
use std::time::Duration;

/// Resolve a URL given to [`Utils::visit_page`] against the configured base URL
///
/// URLs with a scheme are used as-is; relative paths, queries and fragments are appended to the base URL;
/// bare hosts get `http://` (localhost) or `https://`.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    let trimmed = url.trim();

    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("file://")
        || trimmed.starts_with("data:")
        || trimmed.starts_with("about:")
        || trimmed.starts_with("chrome://")
    {
        return trimmed.to_string();
    }

    // Query or fragment only: stays on the base URL
    if trimmed.starts_with('?') || trimmed.starts_with('#') {
        return format!("{}{}", base_url, trimmed);
    }

    if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with("../") || trimmed.is_empty() {
        if base_url.is_empty() {
            return trimmed.to_string();
        }
        let path = trimmed.strip_prefix("./").unwrap_or(trimmed).trim_start_matches('/');
        return format!("{}/{}", base_url.trim_end_matches('/'), path);
    }

    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    format!("https://{}", trimmed)
}

/// Logged browser helpers shared by every page object
pub struct Utils<D: Driver> {
    driver: D,
    config: Arc<TestConfig>,
    log: CommandLog,
}

impl<D: Driver> Utils<D> {
    pub fn new(driver: D, config: Arc<TestConfig>) -> Self {
        Self::with_log(driver, config, CommandLog::new())
    }

    /// Build helpers that append to an existing command log
    pub fn with_log(driver: D, config: Arc<TestConfig>, log: CommandLog) -> Self {
        Self { driver, config, log }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.log
    }

    fn command_timeout(&self) -> Duration {
        self.driver.timeouts().command
    }

    fn should(&self, expectation: Expectation) -> Result<()> {
        assertion::should(&self.driver, &expectation, self.command_timeout())
    }

    fn find(&self, target: &Target) -> Result<Vec<ElementNode>> {
        assertion::resolve_with_retry(&self.driver, target, self.command_timeout())
    }

    fn find_one(&self, target: &Target) -> Result<ElementNode> {
        let nodes = self.find(target)?;
        action_index(target, nodes.len())?;
        nodes
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(target.to_string()))
    }

    // Storage

    pub fn clear_all_cookies(&self) -> Result<()> {
        self.driver.clear_cookies()?;
        self.action_log("All cookies cleared");
        Ok(())
    }

    pub fn clear_all_local_storage(&self) -> Result<()> {
        self.driver.clear_local_storage()?;
        self.action_log("Local storage cleared");
        Ok(())
    }

    pub fn clear_all_session_storage(&self) -> Result<()> {
        self.driver.clear_session_storage()?;
        self.action_log("Session storage cleared");
        Ok(())
    }

    /// Clear cookies, then local storage, then session storage
    pub fn clear_all_storage(&self) -> Result<()> {
        self.clear_all_cookies()?;
        self.clear_all_local_storage()?;
        self.clear_all_session_storage()?;
        self.action_log("All storage cleared");
        Ok(())
    }

    // Navigation and input

    pub fn visit_page(&self, url: &str) -> Result<()> {
        self.action_log(format!("Visiting \"{}\"", url));
        self.driver.visit(&resolve_url(&self.config.env.base_url, url))
    }

    pub fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.driver.clear_and_type(&Target::css(selector), text)?;
        self.action_log(format!("Typed \"{}\" into element", text));
        Ok(())
    }

    /// Like [`Utils::type_text`], but the value never reaches the log
    pub fn type_password(&self, selector: &str, password: &str) -> Result<()> {
        self.driver.clear_and_type(&Target::css(selector), password)?;
        self.action_log("Typed password in the field");
        Ok(())
    }

    // Clicking

    pub fn click_button_by_text(&self, text: &str) -> Result<()> {
        self.action_log(format!("Clicking element with the text \"{}\"", text));
        self.driver.click(&Target::text(text))?;
        self.action_log(format!("Clicked on \"{}\"", text));
        Ok(())
    }

    pub fn click_button_by_locator(&self, selector: &str) -> Result<()> {
        self.action_log(format!("Clicking element with the locator \"{}\"", selector));
        self.driver.click(&Target::css(selector))?;
        self.action_log("Clicked on element");
        Ok(())
    }

    pub fn click_element_by_test_id(&self, test_id: &str) -> Result<()> {
        self.action_log(format!("Clicking element with data-test-id \"{}\"", test_id));
        self.driver.click(&Target::test_id(test_id))?;
        self.action_log(format!("Clicked on element with data-test-id \"{}\"", test_id));
        Ok(())
    }

    pub fn click_first_element(&self, selector: &str) -> Result<()> {
        self.action_log(format!("Clicking first element with the locator \"{}\"", selector));
        self.driver.click(&Target::css(selector).first())?;
        self.action_log("Clicked on first element");
        Ok(())
    }

    pub fn click_last_element(&self, selector: &str) -> Result<()> {
        self.action_log(format!("Clicking last element with the locator \"{}\"", selector));
        self.driver.click(&Target::css(selector).last())?;
        self.action_log("Clicked on last element");
        Ok(())
    }

    // Network

    /// Register an interception for `method` requests matching the URL glob, under `alias`
    pub fn intercept_request(&self, method: &str, url_pattern: &str, alias: &str) -> Result<()> {
        self.log_message(format!("Intercepting {} request for pattern \"{}\" as \"{}\"", method, url_pattern, alias));
        let route = Route::new(method, url_pattern, alias)?;
        self.driver.intercepts().register(route);
        self.driver.start_intercepting()
    }

    pub fn intercept_get_request(&self, url_pattern: &str, alias: &str) -> Result<()> {
        self.intercept_request("GET", url_pattern, alias)
    }

    pub fn intercept_post_request(&self, url_pattern: &str, alias: &str) -> Result<()> {
        self.intercept_request("POST", url_pattern, alias)
    }

    fn wait_for_alias(&self, alias: &str) -> Result<InterceptedResponse> {
        self.driver.intercepts().wait_for(alias, self.driver.timeouts().response)
    }

    /// Wait for the next response on `alias` and write it to the log
    pub fn log_response(&self, alias: &str) -> Result<InterceptedResponse> {
        let response = self.wait_for_alias(alias)?;
        self.log_message(response.to_string());
        Ok(response)
    }

    fn check_response(
        alias: &str,
        response: &InterceptedResponse,
        status_code: Option<u16>,
        status_message: Option<&str>,
    ) -> Result<()> {
        if let Some(expected) = status_code {
            if response.status_code != expected {
                return Err(BrowserError::AssertionMismatch {
                    subject: format!("status code of @{}", alias),
                    expected: expected.to_string(),
                    actual: response.status_code.to_string(),
                });
            }
        }

        if let Some(expected) = status_message {
            if response.status_message != expected {
                return Err(BrowserError::AssertionMismatch {
                    subject: format!("status message of @{}", alias),
                    expected: expected.to_string(),
                    actual: response.status_message.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn wait_for_response_status_code(&self, alias: &str, status_code: u16) -> Result<()> {
        let response = self.wait_for_alias(alias)?;
        Self::check_response(alias, &response, Some(status_code), None)?;
        self.assertion_log(format!("Verified status code \"{}\" for intercepted request \"{}\"", status_code, alias));
        Ok(())
    }

    pub fn wait_for_response_status_message(&self, alias: &str, status_message: &str) -> Result<()> {
        let response = self.wait_for_alias(alias)?;
        Self::check_response(alias, &response, None, Some(status_message))?;
        self.assertion_log(format!(
            "Verified status message \"{}\" for intercepted request \"{}\"",
            status_message, alias
        ));
        Ok(())
    }

    pub fn wait_for_response_status_code_and_message(
        &self,
        alias: &str,
        status_code: u16,
        status_message: &str,
    ) -> Result<()> {
        let response = self.wait_for_alias(alias)?;
        Self::check_response(alias, &response, Some(status_code), Some(status_message))?;
        self.assertion_log(format!(
            "Verified status code \"{}\" and status message \"{}\" for intercepted request \"{}\"",
            status_code, status_message, alias
        ));
        Ok(())
    }

    /// Check the latest captured response without waiting for a new one
    pub fn verify_response_status_code(&self, alias: &str, status_code: u16) -> Result<()> {
        self.should(Expectation::ResponseStatus {
            alias: alias.to_string(),
            status_code: Some(status_code),
            status_message: None,
        })?;
        self.assertion_log(format!("Verified status code \"{}\" for intercepted request \"{}\"", status_code, alias));
        Ok(())
    }

    pub fn verify_response_status_message(&self, alias: &str, status_message: &str) -> Result<()> {
        self.should(Expectation::ResponseStatus {
            alias: alias.to_string(),
            status_code: None,
            status_message: Some(status_message.to_string()),
        })?;
        self.assertion_log(format!(
            "Verified status message \"{}\" for intercepted request \"{}\"",
            status_message, alias
        ));
        Ok(())
    }

    pub fn verify_response_status_code_and_message(
        &self,
        alias: &str,
        status_code: u16,
        status_message: &str,
    ) -> Result<()> {
        self.should(Expectation::ResponseStatus {
            alias: alias.to_string(),
            status_code: Some(status_code),
            status_message: Some(status_message.to_string()),
        })?;
        self.assertion_log(format!(
            "Verified status code \"{}\" and status message \"{}\" for intercepted request \"{}\"",
            status_code, status_message, alias
        ));
        Ok(())
    }

    // URL and title

    pub fn verify_partial_url(&self, partial_path: &str) -> Result<()> {
        self.should(Expectation::UrlContains(partial_path.to_string()))?;
        self.assertion_log(format!("Verified URL with partial path \"{}\"", partial_path));
        Ok(())
    }

    pub fn verify_full_url(&self, full_url: &str) -> Result<()> {
        self.should(Expectation::UrlEquals(full_url.to_string()))?;
        self.assertion_log(format!("Verified URL \"{}\"", full_url));
        Ok(())
    }

    /// Same as [`Utils::verify_full_url`] with the configured base URL prepended
    pub fn verify_full_url_with_base_url(&self, partial_path: &str) -> Result<()> {
        let full_url = format!("{}{}", self.config.env.base_url, partial_path);
        self.verify_full_url(&full_url)
    }

    pub fn verify_page_title(&self, title: &str) -> Result<()> {
        self.should(Expectation::TitleEquals(title.to_string()))?;
        self.assertion_log(format!("Verified page title \"{}\"", title));
        Ok(())
    }

    // Visibility and existence

    pub fn element_is_visible(&self, selector: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::Visible(Target::css(selector)))?;
        match elem {
            None => self.assertion_log("Element is visible"),
            Some(name) => self.assertion_log(format!("\"{}\" is visible", name)),
        }
        Ok(())
    }

    pub fn first_element_is_visible(&self, selector: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::Visible(Target::css(selector).first()))?;
        match elem {
            None => self.assertion_log("Element is visible"),
            Some(name) => self.assertion_log(format!("First element of \"{}\" is visible", name)),
        }
        Ok(())
    }

    pub fn last_element_is_visible(&self, selector: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::Visible(Target::css(selector).last()))?;
        match elem {
            None => self.assertion_log("Element is visible"),
            Some(name) => self.assertion_log(format!("Last element of \"{}\" is visible", name)),
        }
        Ok(())
    }

    /// Check every matched element separately, logging one line per element
    pub fn each_element_is_visible(&self, selector: &str) -> Result<()> {
        let nodes = self.find(&Target::css(selector))?;

        for (i, node) in nodes.iter().enumerate() {
            self.should(Expectation::Visible(Target::css(selector).nth(i)))?;
            self.assertion_log(format!("Element containing \"{}\" is visible", node.text_content));
        }

        Ok(())
    }

    pub fn check_visibility_by_test_id(&self, test_id: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::Visible(Target::test_id(test_id)))?;
        match elem {
            None => self.assertion_log(format!("Element with data-test-id \"{}\" is visible", test_id)),
            Some(name) => self.assertion_log(format!("\"{}\" is visible", name)),
        }
        Ok(())
    }

    pub fn element_is_visible_by_text(&self, text: &str) -> Result<()> {
        self.should(Expectation::Visible(Target::text(text)))?;
        self.assertion_log(format!("Element containing text \"{}\" is visible", text));
        Ok(())
    }

    pub fn element_is_not_visible(&self, selector: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::NotVisible(Target::css(selector)))?;
        match elem {
            None => self.assertion_log("Element is not visible"),
            Some(name) => self.assertion_log(format!("\"{}\" is not visible", name)),
        }
        Ok(())
    }

    pub fn element_is_not_visible_by_text(&self, text: &str) -> Result<()> {
        self.should(Expectation::NotVisible(Target::text(text)))?;
        self.assertion_log(format!("Element containing text \"{}\" is not visible", text));
        Ok(())
    }

    /// The element is in the DOM but not visible
    pub fn element_exists(&self, selector: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::Exists(Target::css(selector)))?;
        self.should(Expectation::NotVisible(Target::css(selector)))?;
        match elem {
            None => self.assertion_log("Element exists in DOM"),
            Some(name) => self.assertion_log(format!("\"{}\" exists in DOM", name)),
        }
        Ok(())
    }

    pub fn element_does_not_exist(&self, selector: &str, elem: Option<&str>) -> Result<()> {
        self.should(Expectation::NotExists(Target::css(selector)))?;
        match elem {
            None => self.assertion_log("Element does not exist in DOM"),
            Some(name) => self.assertion_log(format!("\"{}\" does not exist in DOM", name)),
        }
        Ok(())
    }

    // Text and attributes

    pub fn element_contains_text(&self, selector: &str, text: &str) -> Result<()> {
        self.should(Expectation::ContainsText(Target::css(selector), text.to_string()))?;
        self.assertion_log(format!("Element containing the text \"{}\" verified", text));
        Ok(())
    }

    /// Trimmed text of the matched elements
    pub fn get_element_text(&self, selector: &str) -> Result<String> {
        self.action_log("Retrieving text from element");
        let nodes = self.find(&Target::css(selector))?;
        let text: String = nodes.iter().map(|n| n.text_content.as_str()).collect();
        Ok(text.trim().to_string())
    }

    pub fn get_element(&self, selector: &str) -> Result<ElementNode> {
        self.find_one(&Target::css(selector))
    }

    pub fn get_elements(&self, selector: &str) -> Result<Vec<ElementNode>> {
        self.find(&Target::css(selector))
    }

    pub fn get_element_by_test_id(&self, test_id: &str) -> Result<ElementNode> {
        self.find_one(&Target::test_id(test_id))
    }

    pub fn get_first_element(&self, selector: &str) -> Result<ElementNode> {
        self.find_one(&Target::css(selector).first())
    }

    pub fn get_last_element(&self, selector: &str) -> Result<ElementNode> {
        self.find_one(&Target::css(selector).last())
    }

    pub fn verify_element_text(&self, selector: &str, expected: &str) -> Result<()> {
        let actual = self.get_element_text(selector)?;
        if actual != expected {
            return Err(BrowserError::AssertionMismatch {
                subject: format!("text of {}", selector),
                expected: expected.to_string(),
                actual,
            });
        }
        self.assertion_log(format!("Element contains the expected text \"{}\"", expected));
        Ok(())
    }

    pub fn verify_text_by_test_id(&self, test_id: &str, expected: &str) -> Result<()> {
        let selector = crate::dom::locator::test_id_selector(test_id);
        let actual = self.get_element_text(&selector)?;
        if actual != expected {
            return Err(BrowserError::AssertionMismatch {
                subject: format!("text of {}", selector),
                expected: expected.to_string(),
                actual,
            });
        }
        self.assertion_log(format!("Element with data-test-id \"{}\" contains \"{}\"", test_id, expected));
        Ok(())
    }

    pub fn verify_attribute_value(&self, selector: &str, attribute: &str, expected: &str) -> Result<()> {
        self.should(Expectation::AttributeEquals {
            target: Target::css(selector),
            name: attribute.to_string(),
            value: expected.to_string(),
        })?;
        self.assertion_log(format!("Attribute \"{}\" has value \"{}\"", attribute, expected));
        Ok(())
    }

    // Dropdowns

    fn select_and_verify(&self, target: Target, option: SelectOption) -> Result<()> {
        let selected = self.driver.select(&target, &option)?;
        self.should(Expectation::ValueEquals(target, selected))?;
        self.assertion_log(format!("\"{}\" selected from the dropdown", option.label()));
        Ok(())
    }

    pub fn select_dropdown_by_text(&self, selector: &str, option_text: &str) -> Result<()> {
        self.action_log(format!("Selecting \"{}\" from dropdown", option_text));
        self.select_and_verify(Target::css(selector), SelectOption::Text(option_text.to_string()))
    }

    pub fn select_dropdown_by_value(&self, selector: &str, option_value: &str) -> Result<()> {
        self.action_log(format!("Selecting option with value \"{}\"", option_value));
        self.select_and_verify(Target::css(selector), SelectOption::Value(option_value.to_string()))
    }

    pub fn select_dropdown_by_test_id(&self, test_id: &str, option_value: &str) -> Result<()> {
        self.action_log(format!(
            "Selecting option with value \"{}\" from dropdown with data-test-id \"{}\"",
            option_value, test_id
        ));
        self.select_and_verify(Target::test_id(test_id), SelectOption::Value(option_value.to_string()))
    }

    // Waiting

    /// Fixed-duration pause; prefer a condition-based assertion where one exists
    pub fn wait_for_seconds(&self, seconds: f64) -> Result<()> {
        let duration = Duration::try_from_secs_f64(seconds)
            .map_err(|e| BrowserError::Config(format!("invalid wait of {} seconds: {}", seconds, e)))?;
        self.driver.pause(duration);
        Ok(())
    }

    // Page errors

    /// Drain uncaught page exceptions and apply the configured policy
    pub fn ensure_no_uncaught_exceptions(&self) -> Result<()> {
        for message in self.driver.take_uncaught_exceptions()? {
            if self.config.uncaught_exceptions.fails_on(&message) {
                return Err(BrowserError::UncaughtException(message));
            }
            log::warn!("Ignoring uncaught exception: {}", message);
        }
        Ok(())
    }

    // Logging

    pub fn log_message(&self, message: impl Into<String>) {
        self.log.push(LogKind::Message, message);
    }

    pub fn action_log(&self, description: impl Into<String>) {
        self.log.push(LogKind::Action, description);
    }

    pub fn assertion_log(&self, description: impl Into<String>) {
        self.log.push(LogKind::Assertion, description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_complete() {
        assert_eq!(resolve_url("", "https://example.com"), "https://example.com");
        assert_eq!(resolve_url("http://base", "http://example.com/path"), "http://example.com/path");
        assert_eq!(resolve_url("", "about:blank"), "about:blank");
        assert_eq!(resolve_url("", "data:text/html,<h1>Test</h1>"), "data:text/html,<h1>Test</h1>");
        assert_eq!(resolve_url("", "file:///path/to/file"), "file:///path/to/file");
    }

    #[test]
    fn test_resolve_url_relative_with_base() {
        assert_eq!(resolve_url("http://localhost:3000", "/sample/sample"), "http://localhost:3000/sample/sample");
        assert_eq!(resolve_url("http://localhost:3000/", "/login"), "http://localhost:3000/login");
        assert_eq!(resolve_url("https://app.test/portal", "./users"), "https://app.test/portal/users");
        assert_eq!(resolve_url("https://app.test", ""), "https://app.test/");
        assert_eq!(resolve_url("http://localhost:3000", "?tab=1"), "http://localhost:3000?tab=1");
        assert_eq!(resolve_url("http://localhost:3000/users", "#details"), "http://localhost:3000/users#details");
    }

    #[test]
    fn test_resolve_url_relative_without_base() {
        assert_eq!(resolve_url("", "/path"), "/path");
        assert_eq!(resolve_url("", "./relative"), "./relative");
        assert_eq!(resolve_url("", "../parent"), "../parent");
        assert_eq!(resolve_url("", "?tab=1"), "?tab=1");
    }

    #[test]
    fn test_resolve_url_bare_hosts() {
        assert_eq!(resolve_url("", "localhost:3000"), "http://localhost:3000");
        assert_eq!(resolve_url("", "127.0.0.1:8080/x"), "http://127.0.0.1:8080/x");
        assert_eq!(resolve_url("", "example.com"), "https://example.com");
        assert_eq!(resolve_url("", "  example.com/path  "), "https://example.com/path");
    }
}
