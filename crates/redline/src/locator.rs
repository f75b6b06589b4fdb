//! Locator abstraction for element selection.
//!
//! A fixture names elements with Playwright-style selector strings. Plain
//! strings are CSS; a `text=` prefix selects by text content. Each selector
//! compiles to the small JavaScript expressions the CDP driver evaluates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button#login")
    Css(String),
    /// Text content selector (`text=Learn more`)
    Text(String),
}

impl Selector {
    /// Parse a fixture selector string
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix("text=") {
            Some(text) => Self::Text(text.trim_matches('"').to_string()),
            None => Self::Css(raw.to_string()),
        }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// JavaScript expression yielding the array of matching elements
    ///
    /// A text selector matches every element under `body` whose text
    /// contains the string, ancestors included, in document order.
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::Text(t) => format!(
                "Array.from(document.querySelectorAll('body *')).filter(el => \
                 el.textContent.includes({}))",
                js_string(t)
            ),
        }
    }

    /// JavaScript expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_all_query())
    }

    /// JavaScript expression describing the first match, or `null`
    ///
    /// Visibility follows Playwright: a non-empty bounding box and no
    /// `visibility: hidden`.
    #[must_use]
    pub fn to_probe_query(&self) -> String {
        format!(
            "(() => {{ const el = {}[0]; if (!el) return null; \
             const style = window.getComputedStyle(el); \
             const rect = el.getBoundingClientRect(); \
             return {{ text: el.textContent || '', \
             visible: style.visibility !== 'hidden' && rect.width > 0 && rect.height > 0, \
             enabled: !el.disabled && !el.closest('fieldset[disabled]') }}; }})()",
            self.to_all_query()
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text={t}"),
        }
    }
}

/// Quote a string as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// A locator for finding elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
}

impl Locator {
    /// Create a new locator from a fixture selector string
    #[must_use]
    pub fn new(selector: &str) -> Self {
        Self {
            selector: Selector::parse(selector),
        }
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self { selector }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "locator('{}')", self.selector)
    }
}

/// State of the first element a locator resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProbe {
    /// Raw `textContent`
    pub text: String,
    /// Rendered with a non-empty box
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
}

impl ElementProbe {
    /// Text with whitespace collapsed, as Playwright compares it
    #[must_use]
    pub fn normalized_text(&self) -> String {
        normalize_whitespace(&self.text)
    }
}

/// Collapse runs of whitespace and trim
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
