use thiserror::Error;

/// Errors raised by the driver, the helpers and the runner
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The checked condition never became true within the timeout
    #[error("Timed out after {timeout_ms}ms: expected {expected}, but {actual}")]
    AssertionFailed { expected: String, actual: String, timeout_ms: u64 },

    /// A value read once did not match
    #[error("Expected {subject} to equal \"{expected}\", but it was \"{actual}\"")]
    AssertionMismatch { subject: String, expected: String, actual: String },

    #[error("Timed out after {timeout_ms}ms waiting for a response to \"@{alias}\"")]
    ResponseTimeout { alias: String, timeout_ms: u64 },

    #[error("No interception registered under alias \"@{0}\"")]
    UnknownAlias(String),

    #[error("'{selector}' matched {count} elements, but only a single element can be used")]
    MultipleElements { selector: String, count: usize },

    #[error("No option \"{option}\" in dropdown '{selector}'")]
    OptionNotFound { selector: String, option: String },

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),

    #[error("Uncaught exception in the page under test: {0}")]
    UncaughtException(String),

    #[error("Failed to capture screenshot: {0}")]
    ScreenshotFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BrowserError>;

impl BrowserError {
    /// Whether this error is a failed assertion rather than a driver or configuration problem
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            BrowserError::AssertionFailed { .. }
                | BrowserError::AssertionMismatch { .. }
                | BrowserError::ResponseTimeout { .. }
        )
    }
}
