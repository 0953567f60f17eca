//! # browser-pom
//!
//! A Rust library of logged browser helpers and page objects for end-to-end tests,
//! driving Chrome/Chromium over the Chrome DevTools Protocol (CDP).
//!
//! ## Features
//!
//! - **Logged helpers**: every click, keystroke and assertion writes a readable
//!   `Action:` / `Assertion:` line to a command log attached to failure reports
//! - **Retrying assertions**: visibility, text, URL, title and attribute checks poll
//!   until they hold or the command timeout elapses
//! - **Network interception**: name requests by alias and wait on or assert their
//!   responses
//! - **Page objects**: small facades that borrow the shared helpers
//! - **Runner**: retries, test isolation, failure screenshots and a JSON run report
//!
//! ## Smoke runner
//!
//! ```bash
//! # Run against a local app
//! cargo run --bin pom-smoke -- --base-url http://localhost:3000
//!
//! # With a visible browser (useful for debugging)
//! cargo run --bin pom-smoke -- --base-url http://localhost:3000 --headed
//! ```
//!
//! ## Library Usage
//!
//! ### Helpers
//!
//! ```rust,no_run
//! use browser_pom::{ChromeDriver, LaunchOptions, TestConfig, Utils};
//! use std::sync::Arc;
//!
//! # fn main() -> browser_pom::Result<()> {
//! let config = Arc::new(TestConfig::default().with_base_url("http://localhost:3000"));
//! let driver = ChromeDriver::launch(LaunchOptions::from_config(&config), &config)?;
//! let utils = Utils::new(driver, config);
//!
//! utils.intercept_get_request("/api/users*", "getUsers")?;
//! utils.visit_page("/users")?;
//! utils.wait_for_response_status_code_and_message("getUsers", 200, "OK")?;
//! utils.element_is_visible("table.users", Some("Users table"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Page objects and the runner
//!
//! ```rust,no_run
//! use browser_pom::pages::SamplePage;
//! use browser_pom::{ChromeDriver, LaunchOptions, RunMode, TestConfig, TestRunner, Utils};
//! use std::sync::Arc;
//!
//! # fn main() -> browser_pom::Result<()> {
//! let config = Arc::new(TestConfig::default());
//! let driver = ChromeDriver::launch(LaunchOptions::from_config(&config), &config)?;
//! let mut runner = TestRunner::new(Utils::new(driver, config), RunMode::Run);
//!
//! runner.run("opens the sample page", |utils| {
//!     let page = SamplePage::new(utils);
//!     utils.visit_page("/")?;
//!     page.click()?;
//!     page.verify_url()
//! });
//!
//! runner.report().write("reports")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`utils`]: **the helper vocabulary** - start here
//! - [`pages`]: page objects built on the helpers
//! - [`driver`]: the [`Driver`] trait and its Chrome implementation
//! - [`assertion`]: retrying expectations
//! - [`network`]: interception routes and captured responses
//! - [`runner`]: retries, screenshots and the run report
//! - [`browser`]: browser session management and launch options
//! - [`dom`]: locators and element snapshots
//! - [`config`]: test configuration
//! - [`error`]: error types and result aliases

pub mod assertion;
pub mod browser;
pub mod command_log;
pub mod config;
pub mod dom;
pub mod driver;
pub mod error;
pub mod network;
pub mod pages;
pub mod runner;
pub mod utils;

pub use assertion::{Expectation, should};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use command_log::{CommandLog, LogEntry, LogKind};
pub use config::{EnvBag, ExceptionPolicy, ReporterOptions, Retries, RunMode, TestConfig};
pub use dom::{BoundingBox, ElementNode, Locator, Pick, Target};
pub use driver::{ChromeDriver, Driver, SelectOption, Timeouts};
pub use error::{BrowserError, Result};
pub use network::{InterceptRegistry, InterceptedResponse, Route};
pub use runner::{RunReport, TestOutcome, TestRunner, TestState};
pub use utils::Utils;
