use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Kind of a command log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Message,
    Action,
    Assertion,
}

/// One line of the test report's command log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LogKind::Message => write!(f, "{}", self.message),
            LogKind::Action => write!(f, "Action: {}", self.message),
            LogKind::Assertion => write!(f, "Assertion: {}", self.message),
        }
    }
}

/// Append-only log of what a test did, shared between the helpers and the runner
///
/// Cloning is cheap and every clone appends to the same stream.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry and mirror it to the `log` facade
    pub fn push(&self, kind: LogKind, message: impl Into<String>) {
        let entry = LogEntry { kind, message: message.into() };
        log::info!("{}", entry);
        self.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every entry so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Entries appended after position `mark` (see [`CommandLog::len`])
    pub fn since(&self, mark: usize) -> Vec<LogEntry> {
        self.lock().iter().skip(mark).cloned().collect()
    }

    /// Rendered lines, e.g. `Action: Visiting "/login"`
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }

    /// Whether any rendered line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|e| e.to_string().contains(needle))
    }

    /// Export to JSON for the run report
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.lock())
    }
}
