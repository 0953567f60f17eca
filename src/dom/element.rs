use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of one element matched by a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "button", "input"), lower-cased
    pub tag_name: String,

    /// Element attributes (e.g., id, class, data-test-id)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Trimmed text content of the element
    #[serde(default)]
    pub text_content: String,

    /// Current form value for input, select and textarea elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Whether the element is rendered and takes up space
    #[serde(default)]
    pub is_visible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Viewport rectangle from `getBoundingClientRect`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Empty, hidden element with the given tag
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: String::new(),
            value: None,
            is_visible: false,
            bounding_box: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// The `data-test-id` attribute, if set
    pub fn test_id(&self) -> Option<&String> {
        self.attributes.get(super::TEST_ID_ATTRIBUTE)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Short description used in assertion messages, e.g. `<button#save.primary>`
    pub fn describe(&self) -> String {
        let mut out = format!("<{}", self.tag_name);

        if let Some(id) = self.attributes.get("id") {
            out.push('#');
            out.push_str(id);
        }

        if let Some(class) = self.attributes.get("class") {
            for c in class.split_whitespace() {
                out.push('.');
                out.push_str(c);
            }
        }

        out.push('>');
        out
    }
}
