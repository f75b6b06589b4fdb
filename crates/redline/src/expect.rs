//! Playwright-style `expect` assertions.
//!
//! Each [`Expectation`] is evaluated with auto-wait: the page is observed
//! repeatedly until the assertion holds or the timeout passes, and the last
//! observed value is reported. A mismatch is an [`AssertionOutcome`], not an
//! error; only driver failures surface as [`RedlineError`](crate::RedlineError).

use crate::driver::PageDriver;
use crate::locator::{normalize_whitespace, Locator};
use crate::result::RedlineResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Default assertion timeout (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Received value when a locator resolves to nothing
pub const NOT_FOUND: &str = "<element(s) not found>";

/// Auto-wait options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectOptions {
    /// Timeout in milliseconds (0 = evaluate once)
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ExpectOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ExpectOptions {
    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as Duration, never shorter than 1ms
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        let ms = if self.poll_interval_ms == 0 {
            1
        } else {
            self.poll_interval_ms
        };
        Duration::from_millis(ms)
    }
}

/// The six assertion kinds fixtures use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionKind {
    /// Page title equals
    TitleEquals,
    /// Page URL equals
    UrlEquals,
    /// Element text equals
    TextEquals,
    /// Element is visible
    Visible,
    /// Element is enabled
    Enabled,
    /// Element count equals
    CountEquals,
}

impl AssertionKind {
    /// Playwright matcher name
    #[must_use]
    pub const fn matcher_name(&self) -> &'static str {
        match self {
            Self::TitleEquals => "toHaveTitle",
            Self::UrlEquals => "toHaveURL",
            Self::TextEquals => "toHaveText",
            Self::Visible => "toBeVisible",
            Self::Enabled => "toBeEnabled",
            Self::CountEquals => "toHaveCount",
        }
    }

    /// Label the triage engine assigns to this failure
    #[must_use]
    pub const fn triage_label(&self) -> &'static str {
        match self {
            Self::TitleEquals => "Assertion: Title Mismatch",
            Self::UrlEquals => "Assertion: URL Mismatch",
            Self::TextEquals => "Assertion: Text Mismatch",
            Self::Visible => "Assertion: Element Not Visible",
            Self::Enabled => "Assertion: Element Not Enabled",
            Self::CountEquals => "Assertion: Count Mismatch",
        }
    }

    const fn takes_argument(&self) -> bool {
        !matches!(self, Self::Visible | Self::Enabled)
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TitleEquals => "title-equals",
            Self::UrlEquals => "url-equals",
            Self::TextEquals => "text-equals",
            Self::Visible => "visible",
            Self::Enabled => "enabled",
            Self::CountEquals => "count-equals",
        };
        f.write_str(name)
    }
}

/// A single assertion with its hard-coded expected value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assert", rename_all = "snake_case")]
pub enum Expectation {
    /// `expect(page).toHaveTitle(expected)`
    ToHaveTitle {
        /// Expected title
        expected: String,
    },
    /// `expect(page).toHaveURL(expected)`
    ToHaveUrl {
        /// Expected URL
        expected: String,
    },
    /// `expect(locator).toHaveText(expected)`
    ToHaveText {
        /// Element selector
        locator: String,
        /// Expected text
        expected: String,
    },
    /// `expect(locator).toBeVisible()`
    ToBeVisible {
        /// Element selector
        locator: String,
    },
    /// `expect(locator).toBeEnabled()`
    ToBeEnabled {
        /// Element selector
        locator: String,
    },
    /// `expect(locator).toHaveCount(expected)`
    ToHaveCount {
        /// Element selector
        locator: String,
        /// Expected number of matches
        expected: usize,
    },
}

/// One observation of the page
struct Observation {
    passed: bool,
    received: String,
}

impl Observation {
    const fn new(passed: bool, received: String) -> Self {
        Self { passed, received }
    }

    fn not_found() -> Self {
        Self::new(false, NOT_FOUND.to_string())
    }
}

impl Expectation {
    /// Assertion kind
    #[must_use]
    pub const fn kind(&self) -> AssertionKind {
        match self {
            Self::ToHaveTitle { .. } => AssertionKind::TitleEquals,
            Self::ToHaveUrl { .. } => AssertionKind::UrlEquals,
            Self::ToHaveText { .. } => AssertionKind::TextEquals,
            Self::ToBeVisible { .. } => AssertionKind::Visible,
            Self::ToBeEnabled { .. } => AssertionKind::Enabled,
            Self::ToHaveCount { .. } => AssertionKind::CountEquals,
        }
    }

    /// Selector string, or `None` when the page itself is asserted on
    #[must_use]
    pub fn raw_locator(&self) -> Option<&str> {
        match self {
            Self::ToHaveTitle { .. } | Self::ToHaveUrl { .. } => None,
            Self::ToHaveText { locator, .. }
            | Self::ToBeVisible { locator }
            | Self::ToBeEnabled { locator }
            | Self::ToHaveCount { locator, .. } => Some(locator),
        }
    }

    /// Parsed locator, or `None` for page assertions
    #[must_use]
    pub fn locator(&self) -> Option<Locator> {
        self.raw_locator().map(Locator::new)
    }

    /// Expected value as Playwright prints it
    #[must_use]
    pub fn expected_value(&self) -> String {
        match self {
            Self::ToHaveTitle { expected }
            | Self::ToHaveUrl { expected }
            | Self::ToHaveText { expected, .. } => quoted(expected),
            Self::ToBeVisible { .. } => "visible".to_string(),
            Self::ToBeEnabled { .. } => "enabled".to_string(),
            Self::ToHaveCount { expected, .. } => expected.to_string(),
        }
    }

    /// `expect(page)` or `expect(locator)` call text
    #[must_use]
    pub fn call(&self) -> String {
        let subject = if self.raw_locator().is_some() {
            "locator"
        } else {
            "page"
        };
        let kind = self.kind();
        let argument = if kind.takes_argument() { "expected" } else { "" };
        format!("expect({subject}).{}({argument})", kind.matcher_name())
    }

    async fn observe(&self, page: &dyn PageDriver) -> RedlineResult<Observation> {
        let observation = match self {
            Self::ToHaveTitle { expected } => {
                let title = page.title().await?;
                Observation::new(&title == expected, quoted(&title))
            }
            Self::ToHaveUrl { expected } => {
                let url = page.url().await?;
                Observation::new(&url == expected, quoted(&url))
            }
            Self::ToHaveText { locator, expected } => {
                match page.probe(Locator::new(locator).selector()).await? {
                    Some(probe) => {
                        let text = probe.normalized_text();
                        Observation::new(text == normalize_whitespace(expected), quoted(&text))
                    }
                    None => Observation::not_found(),
                }
            }
            Self::ToBeVisible { locator } => {
                match page.probe(Locator::new(locator).selector()).await? {
                    Some(probe) if probe.visible => Observation::new(true, "visible".to_string()),
                    Some(_) => Observation::new(false, "hidden".to_string()),
                    None => Observation::not_found(),
                }
            }
            Self::ToBeEnabled { locator } => {
                match page.probe(Locator::new(locator).selector()).await? {
                    Some(probe) if probe.enabled => Observation::new(true, "enabled".to_string()),
                    Some(_) => Observation::new(false, "disabled".to_string()),
                    None => Observation::not_found(),
                }
            }
            Self::ToHaveCount { locator, expected } => {
                let count = page.count(Locator::new(locator).selector()).await?;
                Observation::new(count == *expected, count.to_string())
            }
        };
        Ok(observation)
    }

    /// Evaluate against a page, polling until it holds or the timeout passes
    ///
    /// # Errors
    ///
    /// Returns the driver error if the page cannot be queried.
    pub async fn evaluate(
        &self,
        page: &dyn PageDriver,
        options: &ExpectOptions,
    ) -> RedlineResult<AssertionOutcome> {
        let deadline = Instant::now() + options.timeout();
        let mut attempts = 0_u32;

        loop {
            let observation = self.observe(page).await?;
            attempts += 1;

            let now = Instant::now();
            if observation.passed || now >= deadline {
                tracing::debug!(
                    matcher = self.kind().matcher_name(),
                    passed = observation.passed,
                    attempts,
                    "assertion settled"
                );
                return Ok(self.outcome(observation, attempts, options));
            }
            tokio::time::sleep(options.poll_interval().min(deadline - now)).await;
        }
    }

    fn outcome(
        &self,
        observation: Observation,
        attempts: u32,
        options: &ExpectOptions,
    ) -> AssertionOutcome {
        let expected = self.expected_value();
        let locator = self.locator().map(|l| l.to_string());
        let message = if observation.passed {
            String::new()
        } else {
            let mut message = format!("{} failed\n\n", self.call());
            if let Some(locator) = &locator {
                message.push_str(&format!("Locator:  {locator}\n"));
            }
            message.push_str(&format!(
                "Expected: {expected}\nReceived: {}\nTimeout:  {}ms\n\nCall log:\n  - Expect \"{}\" with timeout {}ms\n",
                observation.received,
                options.timeout_ms,
                self.kind().matcher_name(),
                options.timeout_ms,
            ));
            if let Some(locator) = &locator {
                message.push_str(&format!("  - waiting for {locator}\n"));
            }
            message.push_str(&format!(
                "    {attempts} × unexpected value {}",
                observation.received
            ));
            message
        };

        AssertionOutcome {
            kind: self.kind(),
            passed: observation.passed,
            locator,
            expected,
            received: observation.received,
            attempts,
            message,
        }
    }
}

fn quoted(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Result of evaluating one expectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    /// Assertion kind
    pub kind: AssertionKind,
    /// Whether the assertion held
    pub passed: bool,
    /// Locator display (`locator('p')`), `None` for page assertions
    pub locator: Option<String>,
    /// Expected value as printed
    pub expected: String,
    /// Last observed value as printed
    pub received: String,
    /// Number of observations made
    pub attempts: u32,
    /// Playwright-format failure message (empty when passed)
    pub message: String,
}

impl AssertionOutcome {
    /// First line of the failure message
    #[must_use]
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::Session;
    use crate::snapshot::{PageSnapshot, SnapshotElement, SnapshotSite};
    use std::sync::Arc;

    async fn example_page() -> Box<dyn PageDriver> {
        let site = Arc::new(SnapshotSite::example_domain());
        let mut page = site.new_page().await.unwrap();
        page.goto("https://example.com").await.unwrap();
        page
    }

    fn once() -> ExpectOptions {
        ExpectOptions::default().with_timeout(0)
    }

    mod kind_tests {
        use super::*;

        #[test]
        fn test_matcher_names() {
            assert_eq!(AssertionKind::TitleEquals.matcher_name(), "toHaveTitle");
            assert_eq!(AssertionKind::UrlEquals.matcher_name(), "toHaveURL");
            assert_eq!(AssertionKind::CountEquals.matcher_name(), "toHaveCount");
        }

        #[test]
        fn test_triage_labels() {
            assert_eq!(
                AssertionKind::TitleEquals.triage_label(),
                "Assertion: Title Mismatch"
            );
            assert_eq!(
                AssertionKind::Visible.triage_label(),
                "Assertion: Element Not Visible"
            );
            assert_eq!(
                AssertionKind::Enabled.triage_label(),
                "Assertion: Element Not Enabled"
            );
        }

        #[test]
        fn test_call_text() {
            let title = Expectation::ToHaveTitle {
                expected: "x".to_string(),
            };
            assert_eq!(title.call(), "expect(page).toHaveTitle(expected)");
            let visible = Expectation::ToBeVisible {
                locator: "p".to_string(),
            };
            assert_eq!(visible.call(), "expect(locator).toBeVisible()");
        }

        #[test]
        fn test_yaml_tag() {
            let e: Expectation =
                serde_yaml_ng::from_str("assert: to_have_count\nlocator: p\nexpected: 5\n")
                    .unwrap();
            assert_eq!(
                e,
                Expectation::ToHaveCount {
                    locator: "p".to_string(),
                    expected: 5
                }
            );
            assert_eq!(e.expected_value(), "5");
        }
    }

    mod evaluate_tests {
        use super::*;

        #[tokio::test]
        async fn test_title_mismatch_message() {
            let page = example_page().await;
            let e = Expectation::ToHaveTitle {
                expected: "Welcome to Example Website".to_string(),
            };
            let outcome = e.evaluate(page.as_ref(), &once()).await.unwrap();
            assert!(!outcome.passed);
            assert_eq!(outcome.received, "\"Example Domain\"");
            assert_eq!(outcome.attempts, 1);
            assert_eq!(outcome.headline(), "expect(page).toHaveTitle(expected) failed");
            assert!(outcome
                .message
                .contains("Expected: \"Welcome to Example Website\"\nReceived: \"Example Domain\""));
            assert!(outcome.locator.is_none());
        }

        #[tokio::test]
        async fn test_title_match_passes() {
            let page = example_page().await;
            let e = Expectation::ToHaveTitle {
                expected: "Example Domain".to_string(),
            };
            let outcome = e.evaluate(page.as_ref(), &once()).await.unwrap();
            assert!(outcome.passed);
            assert!(outcome.message.is_empty());
        }

        #[tokio::test]
        async fn test_count_mismatch() {
            let page = example_page().await;
            let e = Expectation::ToHaveCount {
                locator: "p".to_string(),
                expected: 5,
            };
            let outcome = e.evaluate(page.as_ref(), &once()).await.unwrap();
            assert!(!outcome.passed);
            assert_eq!(outcome.received, "2");
            assert!(outcome.message.contains("Locator:  locator('p')"));
        }

        #[tokio::test]
        async fn test_missing_element_not_found() {
            let page = example_page().await;
            let e = Expectation::ToBeVisible {
                locator: "button#login".to_string(),
            };
            let outcome = e.evaluate(page.as_ref(), &once()).await.unwrap();
            assert!(!outcome.passed);
            assert_eq!(outcome.received, NOT_FOUND);
            assert!(outcome.message.contains("Received: <element(s) not found>"));
        }

        #[tokio::test]
        async fn test_text_normalizes_whitespace() {
            let page = example_page().await;
            let e = Expectation::ToHaveText {
                locator: "h1".to_string(),
                expected: "  Example\n Domain ".to_string(),
            };
            assert!(e.evaluate(page.as_ref(), &once()).await.unwrap().passed);
        }

        #[tokio::test]
        async fn test_hidden_and_disabled_elements() {
            let mut hidden = SnapshotElement::new(&["#menu"], "Menu");
            hidden.visible = false;
            let mut disabled = SnapshotElement::new(&["#buy"], "Buy");
            disabled.enabled = false;
            let site = Arc::new(SnapshotSite::new().with_page(PageSnapshot {
                url: "https://shop.test/".to_string(),
                title: "Shop".to_string(),
                elements: vec![hidden, disabled],
            }));
            let mut page = site.new_page().await.unwrap();
            page.goto("https://shop.test/").await.unwrap();

            let visible = Expectation::ToBeVisible {
                locator: "#menu".to_string(),
            };
            let outcome = visible.evaluate(page.as_ref(), &once()).await.unwrap();
            assert_eq!(outcome.received, "hidden");

            let enabled = Expectation::ToBeEnabled {
                locator: "#buy".to_string(),
            };
            let outcome = enabled.evaluate(page.as_ref(), &once()).await.unwrap();
            assert_eq!(outcome.received, "disabled");
            assert_eq!(outcome.kind.triage_label(), "Assertion: Element Not Enabled");
        }

        #[tokio::test(start_paused = true)]
        async fn test_polls_until_timeout() {
            let page = example_page().await;
            let e = Expectation::ToHaveUrl {
                expected: "https://www.example.org/".to_string(),
            };
            let options = ExpectOptions::default()
                .with_timeout(1_000)
                .with_poll_interval(100);
            let outcome = e.evaluate(page.as_ref(), &options).await.unwrap();
            assert!(!outcome.passed);
            assert_eq!(outcome.attempts, 11);
            assert!(outcome.message.contains("Timeout:  1000ms"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_poll_interval_still_sleeps() {
            let page = example_page().await;
            let e = Expectation::ToHaveTitle {
                expected: "Nope".to_string(),
            };
            let options = ExpectOptions::default()
                .with_timeout(10)
                .with_poll_interval(0);
            assert_eq!(options.poll_interval(), Duration::from_millis(1));
            let outcome = e.evaluate(page.as_ref(), &options).await.unwrap();
            assert_eq!(outcome.attempts, 11);
        }

        #[tokio::test]
        async fn test_blank_page_has_empty_title() {
            let site = Arc::new(SnapshotSite::new());
            let page = site.new_page().await.unwrap();
            let e = Expectation::ToHaveTitle {
                expected: String::new(),
            };
            assert!(e.evaluate(page.as_ref(), &once()).await.unwrap().passed);
        }
    }
}
