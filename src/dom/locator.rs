use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute used as the stable element hook
pub const TEST_ID_ATTRIBUTE: &str = "data-test-id";

/// How to find elements on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// Plain CSS selector
    Css(String),
    /// Value of the `data-test-id` attribute
    TestId(String),
    /// Deepest element whose text contains the string (first match only)
    Text(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Locator::TestId(id.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }

    /// CSS selector for this locator, if it has one
    pub fn css_selector(&self) -> Option<String> {
        match self {
            Locator::Css(selector) => Some(selector.clone()),
            Locator::TestId(id) => Some(test_id_selector(id)),
            Locator::Text(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::TestId(id) => write!(f, "{}", test_id_selector(id)),
            Locator::Text(text) => write!(f, "text \"{}\"", text),
        }
    }
}

/// CSS selector for a `data-test-id` value
pub fn test_id_selector(id: &str) -> String {
    format!("[{}=\"{}\"]", TEST_ID_ATTRIBUTE, id.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Narrowing applied to the resolved element set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    #[default]
    All,
    First,
    Last,
    Nth(usize),
}

impl Pick {
    /// Apply the narrowing to an already resolved set
    pub fn apply<T>(self, mut items: Vec<T>) -> Vec<T> {
        match self {
            Pick::All => items,
            Pick::First => {
                items.truncate(1);
                items
            }
            Pick::Last => items.pop().into_iter().collect(),
            Pick::Nth(i) if i < items.len() => vec![items.swap_remove(i)],
            Pick::Nth(_) => Vec::new(),
        }
    }
}

/// A locator plus the narrowing applied to its matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub locator: Locator,
    #[serde(default)]
    pub pick: Pick,
}

impl Target {
    pub fn new(locator: Locator) -> Self {
        Self { locator, pick: Pick::All }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Locator::css(selector))
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(Locator::test_id(id))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Locator::text(text))
    }

    pub fn first(mut self) -> Self {
        self.pick = Pick::First;
        self
    }

    pub fn last(mut self) -> Self {
        self.pick = Pick::Last;
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.pick = Pick::Nth(index);
        self
    }
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Target::new(locator)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pick {
            Pick::All => write!(f, "{}", self.locator),
            Pick::First => write!(f, "first of {}", self.locator),
            Pick::Last => write!(f, "last of {}", self.locator),
            Pick::Nth(i) => write!(f, "element {} of {}", i, self.locator),
        }
    }
}
