//! Test runner with retries, failure screenshots and a JSON run report

use crate::command_log::LogEntry;
use crate::config::RunMode;
use crate::driver::Driver;
use crate::error::{BrowserError, Result};
use crate::utils::Utils;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// How many command log entries are attached to a failed attempt
pub const FAILURE_LOG_TAIL: usize = 20;

const REPORT_FILE: &str = "report.json";
const SCREENSHOT_DIR: &str = "screenshots";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestState {
    Passed,
    Failed,
}

/// Screenshot taken when an attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Screenshot {
    /// Base64 PNG stored in the report itself
    Embedded { data: String },
    /// PNG written next to the report
    File { path: PathBuf },
}

/// One execution of a test closure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based
    pub number: u32,
    pub state: TestState,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<Screenshot>,
    /// Trailing command log entries of a failed attempt
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub title: String,
    pub state: TestState,
    pub attempts: Vec<Attempt>,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.state == TestState::Passed
    }
}

/// Everything a run produced, serialized for the HTML/JSON reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub title: String,
    pub charts: bool,
    pub tests: Vec<TestOutcome>,
    pub passed: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn new(title: impl Into<String>, charts: bool) -> Self {
        Self { title: title.into(), charts, tests: Vec::new(), passed: 0, failed: 0 }
    }

    fn push(&mut self, outcome: TestOutcome) {
        if outcome.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.tests.push(outcome);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `report.json` into `dir`, creating it if needed; returns the file path
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.to_json()?)?;
        log::info!("Report written to {}", path.display());
        Ok(path)
    }
}

fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let stem = stem.split('-').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("-");
    if stem.is_empty() { "test".to_string() } else { stem }
}

/// Runs test closures against a shared [`Utils`], collecting a [`RunReport`]
pub struct TestRunner<D: Driver> {
    utils: Utils<D>,
    mode: RunMode,
    report: RunReport,
}

impl<D: Driver> TestRunner<D> {
    pub fn new(utils: Utils<D>, mode: RunMode) -> Self {
        let reporter = &utils.config().reporter;
        let report = RunReport::new(reporter.report_page_title.clone(), reporter.charts);
        Self { utils, mode, report }
    }

    pub fn utils(&self) -> &Utils<D> {
        &self.utils
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    /// Run `test` up to `1 + retries` times until it passes
    pub fn run<F>(&mut self, title: &str, mut test: F) -> &TestOutcome
    where
        F: FnMut(&Utils<D>) -> Result<()>,
    {
        let max_attempts = self.utils.config().retries_for(self.mode).saturating_add(1);
        let mut attempts = Vec::new();

        for number in 1..=max_attempts {
            log::info!("Running \"{}\" (attempt {} of {})", title, number, max_attempts);
            let attempt = self.attempt(title, number, &mut test);
            let passed = attempt.state == TestState::Passed;
            attempts.push(attempt);
            if passed {
                break;
            }
        }

        let state = match attempts.last() {
            Some(last) => last.state,
            None => TestState::Failed,
        };

        if !self.utils.config().reporter.save_all_attempts && attempts.len() > 1 {
            attempts.drain(..attempts.len() - 1);
        }

        match state {
            TestState::Passed => log::info!("\"{}\" passed", title),
            TestState::Failed => log::error!("\"{}\" failed", title),
        }

        self.report.push(TestOutcome { title: title.to_string(), state, attempts });
        let last = self.report.tests.len() - 1;
        &self.report.tests[last]
    }

    fn attempt<F>(&self, title: &str, number: u32, test: &mut F) -> Attempt
    where
        F: FnMut(&Utils<D>) -> Result<()>,
    {
        let mark = self.utils.command_log().len();
        let started = Instant::now();

        let result = self.isolate().and_then(|_| test(&self.utils)).and_then(|_| self.utils.ensure_no_uncaught_exceptions());
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => Attempt {
                number,
                state: TestState::Passed,
                duration_ms,
                error: None,
                screenshot: None,
                log: Vec::new(),
            },
            Err(e) => {
                log::warn!("Attempt {} of \"{}\" failed: {}", number, title, e);
                let mut entries = self.utils.command_log().since(mark);
                if entries.len() > FAILURE_LOG_TAIL {
                    entries.drain(..entries.len() - FAILURE_LOG_TAIL);
                }
                Attempt {
                    number,
                    state: TestState::Failed,
                    duration_ms,
                    error: Some(e.to_string()),
                    screenshot: self.capture_failure(title, number),
                    log: entries,
                }
            }
        }
    }

    /// Aliases never outlive the attempt that registered them
    fn isolate(&self) -> Result<()> {
        self.utils.driver().intercepts().clear();
        if self.utils.config().test_isolation {
            self.utils.clear_all_storage()?;
        }
        Ok(())
    }

    /// Screenshot problems never mask the test failure itself
    fn capture_failure(&self, title: &str, number: u32) -> Option<Screenshot> {
        match self.save_screenshot(title, number) {
            Ok(screenshot) => Some(screenshot),
            Err(e) => {
                log::warn!("No failure screenshot for \"{}\": {}", title, e);
                None
            }
        }
    }

    fn save_screenshot(&self, title: &str, number: u32) -> Result<Screenshot> {
        let png = self.utils.driver().screenshot()?;
        let reporter = &self.utils.config().reporter;

        if reporter.embedded_screenshots {
            return Ok(Screenshot::Embedded { data: STANDARD.encode(png) });
        }

        let dir = reporter.report_dir.join(SCREENSHOT_DIR);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{} (failed attempt {}).png", file_stem(title), number));
        fs::write(&path, png).map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))?;
        Ok(Screenshot::File { path })
    }
}
