#![allow(dead_code)]

use browser_pom::dom::test_id_selector;
use browser_pom::network::InterceptedResponse;
use browser_pom::{
    BrowserError, Driver, ElementNode, InterceptRegistry, Locator, Result, SelectOption, Target, TestConfig,
    Timeouts, Utils,
};
use browser_pom::driver::action_index;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "http://localhost:3000";

#[derive(Default)]
struct Script {
    elements: Vec<(Locator, Vec<ElementNode>)>,
    options: Vec<(Locator, Vec<(String, String)>)>,
    navigations: Vec<(Locator, String)>,
    url: String,
    title: String,
    exceptions: Vec<String>,
    screenshot_fails: bool,
    calls: Vec<String>,
    pauses: Vec<Duration>,
}

/// In-memory driver whose page state is scripted by the test
///
/// Clones share state, so a test can keep a handle after moving the driver into `Utils`.
#[derive(Clone)]
pub struct FakeDriver {
    script: Arc<Mutex<Script>>,
    intercepts: Arc<InterceptRegistry>,
    timeouts: Timeouts,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script { url: "about:blank".to_string(), ..Default::default() })),
            intercepts: Arc::new(InterceptRegistry::new()),
            timeouts: Timeouts { command: Duration::from_millis(200), response: Duration::from_millis(300) },
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Replace the elements a locator resolves to
    pub fn set_elements(&self, locator: Locator, nodes: Vec<ElementNode>) {
        let mut script = self.script();
        script.elements.retain(|(l, _)| *l != locator);
        script.elements.push((locator, nodes));
    }

    pub fn set_css(&self, selector: &str, nodes: Vec<ElementNode>) {
        self.set_elements(Locator::css(selector), nodes);
    }

    pub fn set_test_id(&self, id: &str, nodes: Vec<ElementNode>) {
        self.set_elements(Locator::test_id(id), nodes);
    }

    /// `(text, value)` pairs of a dropdown
    pub fn set_options(&self, selector: &str, options: &[(&str, &str)]) {
        self.set_options_for(Locator::css(selector), options);
    }

    pub fn set_options_for(&self, locator: Locator, options: &[(&str, &str)]) {
        let options = options.iter().map(|(t, v)| (t.to_string(), v.to_string())).collect();
        self.script().options.push((locator, options));
    }

    /// Clicking the locator changes the URL
    pub fn navigate_on_click(&self, locator: Locator, url: &str) {
        self.script().navigations.push((locator, url.to_string()));
    }

    pub fn set_url(&self, url: &str) {
        self.script().url = url.to_string();
    }

    pub fn set_title(&self, title: &str) {
        self.script().title = title.to_string();
    }

    pub fn throw(&self, message: &str) {
        self.script().exceptions.push(message.to_string());
    }

    pub fn fail_screenshots(&self) {
        self.script().screenshot_fails = true;
    }

    pub fn respond(&self, method: &str, url: &str, status_code: u16, status_message: &str) -> usize {
        self.intercepts.record(InterceptedResponse {
            method: method.to_string(),
            url: url.to_string(),
            status_code,
            status_message: status_message.to_string(),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.script().calls.clone()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.script().pauses.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.script().calls.push(call.into());
    }

    fn lookup(&self, locator: &Locator) -> Vec<ElementNode> {
        let script = self.script();
        find_nodes(&script.elements, locator).map(|(_, nodes)| nodes.clone()).unwrap_or_default()
    }

    fn action_target(&self, target: &Target) -> Result<usize> {
        let count = self.lookup(&target.locator).len();
        action_index(target, count)?.ok_or_else(|| BrowserError::ElementNotFound(target.to_string()))
    }
}

/// Same locator, or a CSS selector naming a scripted test id
fn same_element(scripted: &Locator, wanted: &Locator) -> bool {
    match (scripted, wanted) {
        (Locator::TestId(id), Locator::Css(selector)) => test_id_selector(id) == *selector,
        _ => scripted == wanted,
    }
}

fn find_nodes<'a>(
    elements: &'a [(Locator, Vec<ElementNode>)],
    locator: &Locator,
) -> Option<&'a (Locator, Vec<ElementNode>)> {
    elements
        .iter()
        .find(|(l, _)| l == locator)
        .or_else(|| elements.iter().find(|(l, _)| same_element(l, locator)))
}

fn set_value(elements: &mut [(Locator, Vec<ElementNode>)], locator: &Locator, index: usize, value: &str) {
    let position = elements
        .iter()
        .position(|(l, _)| l == locator)
        .or_else(|| elements.iter().position(|(l, _)| same_element(l, locator)));

    if let Some(position) = position {
        elements[position].1[index].value = Some(value.to_string());
    }
}

impl Driver for FakeDriver {
    fn clear_cookies(&self) -> Result<()> {
        self.record("clear_cookies");
        Ok(())
    }

    fn clear_local_storage(&self) -> Result<()> {
        self.record("clear_local_storage");
        Ok(())
    }

    fn clear_session_storage(&self) -> Result<()> {
        self.record("clear_session_storage");
        Ok(())
    }

    fn visit(&self, url: &str) -> Result<()> {
        self.record(format!("visit {}", url));
        self.script().url = url.to_string();
        Ok(())
    }

    fn query(&self, locator: &Locator) -> Result<Vec<ElementNode>> {
        Ok(self.lookup(locator))
    }

    fn click(&self, target: &Target) -> Result<()> {
        self.action_target(target)?;
        self.record(format!("click {}", target));

        let mut script = self.script();
        let destination = script.navigations.iter().find(|(l, _)| *l == target.locator).map(|(_, u)| u.clone());
        if let Some(url) = destination {
            script.url = url;
        }
        Ok(())
    }

    fn clear_and_type(&self, target: &Target, text: &str) -> Result<()> {
        let index = self.action_target(target)?;
        self.record(format!("type {}", target));

        let mut script = self.script();
        set_value(&mut script.elements, &target.locator, index, text);
        Ok(())
    }

    fn select(&self, target: &Target, option: &SelectOption) -> Result<String> {
        let index = self.action_target(target)?;
        self.record(format!("select {} {}", target, option.label()));

        let mut script = self.script();
        let value = script
            .options
            .iter()
            .find(|(l, _)| *l == target.locator)
            .and_then(|(_, options)| {
                options.iter().find(|(text, value)| match option {
                    SelectOption::Text(t) => text == t,
                    SelectOption::Value(v) => value == v,
                })
            })
            .map(|(_, value)| value.clone())
            .ok_or_else(|| BrowserError::OptionNotFound {
                selector: target.to_string(),
                option: option.label().to_string(),
            })?;

        set_value(&mut script.elements, &target.locator, index, &value);
        Ok(value)
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.script().url.clone())
    }

    fn title(&self) -> Result<String> {
        Ok(self.script().title.clone())
    }

    fn intercepts(&self) -> &InterceptRegistry {
        &self.intercepts
    }

    fn start_intercepting(&self) -> Result<()> {
        self.record("start_intercepting");
        Ok(())
    }

    fn take_uncaught_exceptions(&self) -> Result<Vec<String>> {
        Ok(std::mem::take(&mut self.script().exceptions))
    }

    fn screenshot(&self) -> Result<Vec<u8>> {
        if self.script().screenshot_fails {
            return Err(BrowserError::ScreenshotFailed("scripted failure".to_string()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    fn pause(&self, duration: Duration) {
        self.script().pauses.push(duration);
        std::thread::sleep(duration);
    }
}

pub fn visible(tag: &str, text: &str) -> ElementNode {
    ElementNode::new(tag).with_text(text).with_visibility(true)
}

pub fn hidden(tag: &str, text: &str) -> ElementNode {
    ElementNode::new(tag).with_text(text).with_visibility(false)
}

pub fn config() -> TestConfig {
    TestConfig::default().with_base_url(BASE_URL)
}

/// Helpers over a fresh fake driver, plus a handle to script it
pub fn setup() -> (Utils<FakeDriver>, FakeDriver) {
    setup_with(config())
}

pub fn setup_with(config: TestConfig) -> (Utils<FakeDriver>, FakeDriver) {
    let driver = FakeDriver::new();
    (Utils::new(driver.clone(), Arc::new(config)), driver)
}
