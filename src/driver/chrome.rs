use crate::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use crate::config::TestConfig;
use crate::dom::{ElementNode, Locator, MARK_ATTRIBUTE, Target, parse_query_result, query_script};
use crate::driver::{Driver, SelectOption, Timeouts, action_index};
use crate::error::{BrowserError, Result};
use crate::network::{InterceptRegistry, InterceptedResponse, POLL_INTERVAL};
use headless_chrome::Tab;
use headless_chrome::browser::tab::ResponseHandler;
use headless_chrome::protocol::cdp::Network;
use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::protocol::cdp::Runtime;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::util::Wait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const CLEAR_LOCAL_STORAGE_JS: &str = r#"
    (function() {
        try { window.localStorage.clear(); } catch (e) { return false; }
        return true;
    })()
"#;

const CLEAR_SESSION_STORAGE_JS: &str = r#"
    (function() {
        try { window.sessionStorage.clear(); } catch (e) { return false; }
        return true;
    })()
"#;

const CLEAR_INPUT_JS: &str = r#"
    (function (selector) {
        var el = document.querySelector(selector);
        if (!el) { return false; }
        el.focus();
        if ('value' in el) {
            el.value = '';
        } else if (el.isContentEditable) {
            el.textContent = '';
        }
        el.dispatchEvent(new Event('input', { bubbles: true }));
        return true;
    })
"#;

const SELECT_OPTION_JS: &str = r#"
    (function (selector, by, wanted) {
        var el = document.querySelector(selector);
        if (!el || el.tagName !== 'SELECT') { return null; }
        var match = Array.prototype.slice.call(el.options).find(function (o) {
            return by === 'value' ? o.value === wanted : o.text.trim() === wanted;
        });
        if (!match) { return null; }
        el.value = match.value;
        match.selected = true;
        el.dispatchEvent(new Event('input', { bubbles: true }));
        el.dispatchEvent(new Event('change', { bubbles: true }));
        return match.value;
    })
"#;

/// [`Driver`] backed by a Chrome tab over CDP
pub struct ChromeDriver {
    session: BrowserSession,
    tab: Arc<Tab>,
    timeouts: Timeouts,
    intercepts: Arc<InterceptRegistry>,
    /// Request id -> HTTP method, filled from request events until the response arrives
    pending_methods: Arc<Mutex<HashMap<String, String>>>,
    intercepting: AtomicBool,
    /// Exceptions reported by the Runtime domain, across every document the tab loads
    uncaught: Arc<Mutex<Vec<String>>>,
    next_mark: AtomicU64,
}

impl ChromeDriver {
    /// Drive the active tab of an existing session
    pub fn new(session: BrowserSession, timeouts: Timeouts) -> Result<Self> {
        let tab = session.tab()?;
        tab.set_default_timeout(timeouts.command);

        let uncaught = Arc::new(Mutex::new(Vec::new()));
        listen_for_exceptions(&tab, &uncaught)?;

        Ok(Self {
            session,
            tab,
            timeouts,
            intercepts: Arc::new(InterceptRegistry::new()),
            pending_methods: Arc::new(Mutex::new(HashMap::new())),
            intercepting: AtomicBool::new(false),
            uncaught,
            next_mark: AtomicU64::new(0),
        })
    }

    /// Launch a browser sized to the configured viewport
    pub fn launch(options: LaunchOptions, config: &TestConfig) -> Result<Self> {
        if config.video {
            log::warn!("Video capture is not supported by the Chrome driver; ignoring `video = true`");
        }

        Self::new(BrowserSession::launch(options)?, Timeouts::from_config(config))
    }

    /// Attach to a running browser
    pub fn connect(options: ConnectionOptions, config: &TestConfig) -> Result<Self> {
        Self::new(BrowserSession::connect(options)?, Timeouts::from_config(config))
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn evaluate(&self, js: &str) -> Result<Option<serde_json::Value>> {
        self.tab
            .evaluate(js, false)
            .map(|remote_object| remote_object.value)
            .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))
    }

    fn evaluate_string(&self, js: &str) -> Result<String> {
        match self.evaluate(js)? {
            Some(serde_json::Value::String(s)) => Ok(s),
            Some(other) => Ok(other.to_string()),
            None => Ok(String::new()),
        }
    }

    /// Wait until the target resolves to a single usable element and tag it.
    /// Returns a CSS selector matching exactly that element.
    fn mark(&self, target: &Target) -> Result<String> {
        let token = format!("pom-{}", self.next_mark.fetch_add(1, Ordering::Relaxed));
        let mut last_seen = String::from("found no elements");

        let outcome = Wait::new(self.timeouts.command, POLL_INTERVAL).until(|| {
            let count = match self.query(&target.locator) {
                Ok(nodes) => nodes.len(),
                Err(e) => {
                    last_seen = e.to_string();
                    return None;
                }
            };

            let index = match action_index(target, count) {
                Ok(Some(index)) => index,
                Ok(None) => {
                    last_seen = format!("found {} elements", count);
                    return None;
                }
                Err(e) => return Some(Err(e)),
            };

            match self.evaluate(&query_script(&target.locator, Some((index, &token)))) {
                Ok(value) => match parse_query_result(value) {
                    Ok(nodes) if index < nodes.len() => Some(Ok(())),
                    Ok(_) => None,
                    Err(e) => {
                        last_seen = e.to_string();
                        None
                    }
                },
                Err(e) => {
                    last_seen = e.to_string();
                    None
                }
            }
        });

        match outcome {
            Ok(Ok(())) => Ok(format!("[{}=\"{}\"]", MARK_ATTRIBUTE, token)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BrowserError::ElementNotFound(format!(
                "Timed out after {}ms waiting for {} ({})",
                self.timeouts.command.as_millis(),
                target,
                last_seen
            ))),
        }
    }

}

fn exception_message(details: &Runtime::ExceptionDetails) -> String {
    details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.clone())
        .unwrap_or_else(|| details.text.clone())
}

fn listen_for_exceptions(tab: &Arc<Tab>, uncaught: &Arc<Mutex<Vec<String>>>) -> Result<()> {
    let sink = Arc::clone(uncaught);
    tab.add_event_listener(Arc::new(move |event: &Event| {
        if let Event::RuntimeExceptionThrown(thrown) = event {
            let message = exception_message(&thrown.params.exception_details);
            log::debug!("Page threw: {}", message);
            if let Ok(mut uncaught) = sink.lock() {
                uncaught.push(message);
            }
        }
    }))
    .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to listen for page exceptions: {}", e)))?;

    tab.call_method(Runtime::Enable(None))
        .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to enable the Runtime domain: {}", e)))?;

    Ok(())
}

impl Driver for ChromeDriver {
    fn clear_cookies(&self) -> Result<()> {
        self.tab
            .call_method(Network::ClearBrowserCookies(None))
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to clear cookies: {}", e)))?;
        Ok(())
    }

    fn clear_local_storage(&self) -> Result<()> {
        self.evaluate(CLEAR_LOCAL_STORAGE_JS)?;
        Ok(())
    }

    fn clear_session_storage(&self) -> Result<()> {
        self.evaluate(CLEAR_SESSION_STORAGE_JS)?;
        Ok(())
    }

    fn visit(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationFailed(format!("Navigation to {} did not complete: {}", url, e)))?;

        Ok(())
    }

    fn query(&self, locator: &Locator) -> Result<Vec<ElementNode>> {
        parse_query_result(self.evaluate(&query_script(locator, None))?)
    }

    fn click(&self, target: &Target) -> Result<()> {
        let selector = self.mark(target)?;

        let element = self
            .tab
            .find_element(&selector)
            .map_err(|e| BrowserError::ElementNotFound(format!("Element '{}' not found: {}", target, e)))?;

        element
            .click()
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to click {}: {}", target, e)))?;

        Ok(())
    }

    fn clear_and_type(&self, target: &Target, text: &str) -> Result<()> {
        let selector = self.mark(target)?;

        let script = format!("{}({})", CLEAR_INPUT_JS.trim(), serde_json::Value::from(selector.as_str()));
        self.evaluate(&script)?;

        let element = self
            .tab
            .find_element(&selector)
            .map_err(|e| BrowserError::ElementNotFound(format!("Element '{}' not found: {}", target, e)))?;

        element
            .type_into(text)
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to type into {}: {}", target, e)))?;

        Ok(())
    }

    fn select(&self, target: &Target, option: &SelectOption) -> Result<String> {
        let selector = self.mark(target)?;

        let by = match option {
            SelectOption::Text(_) => "text",
            SelectOption::Value(_) => "value",
        };

        let script = format!(
            "{}({}, {}, {})",
            SELECT_OPTION_JS.trim(),
            serde_json::Value::from(selector.as_str()),
            serde_json::Value::from(by),
            serde_json::Value::from(option.label())
        );

        match self.evaluate(&script)? {
            Some(serde_json::Value::String(value)) => Ok(value),
            _ => Err(BrowserError::OptionNotFound { selector: target.to_string(), option: option.label().to_string() }),
        }
    }

    fn current_url(&self) -> Result<String> {
        self.evaluate_string("window.location.href")
    }

    fn title(&self) -> Result<String> {
        self.evaluate_string("document.title")
    }

    fn intercepts(&self) -> &InterceptRegistry {
        &self.intercepts
    }

    fn start_intercepting(&self) -> Result<()> {
        if self.intercepting.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let methods = Arc::clone(&self.pending_methods);
        self.tab
            .add_event_listener(Arc::new(move |event: &Event| {
                if let Event::NetworkRequestWillBeSent(sent) = event {
                    if let Ok(mut pending) = methods.lock() {
                        pending.insert(sent.params.request_id.clone(), sent.params.request.method.clone());
                    }
                }
            }))
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to listen for requests: {}", e)))?;

        let methods = Arc::clone(&self.pending_methods);
        let registry = Arc::clone(&self.intercepts);
        let handler: ResponseHandler = Box::new(
            move |params: ResponseReceivedEventParams,
                  _fetch_body: &dyn Fn() -> anyhow::Result<Network::GetResponseBodyReturnObject>| {
                let method = methods
                    .lock()
                    .ok()
                    .and_then(|mut pending| pending.remove(&params.request_id))
                    .unwrap_or_else(|| "GET".to_string());

                registry.record(InterceptedResponse {
                    method,
                    url: params.response.url.clone(),
                    status_code: params.response.status as u16,
                    status_message: params.response.status_text.clone(),
                });
            },
        );

        self.tab
            .register_response_handling("browser-pom", handler)
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to intercept responses: {}", e)))?;

        log::debug!("Network interception enabled");
        Ok(())
    }

    fn take_uncaught_exceptions(&self) -> Result<Vec<String>> {
        let mut uncaught = self.uncaught.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(std::mem::take(&mut *uncaught))
    }

    fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))
    }

    fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}
