//! Fixture schema: suites of navigate-and-assert test cases.
//!
//! A suite file looks like:
//!
//! ```yaml
//! suite: Login
//! cases:
//!   - name: should fail - incorrect page title
//!     goto: https://example.com
//!     expect:
//!       assert: to_have_title
//!       expected: Login Portal - Example App
//! ```
//!
//! Records are immutable once loaded. Loading validates structure only; the
//! expected values are deliberately wrong and nothing checks that.

use crate::expect::{AssertionKind, Expectation};
use crate::locator::Locator;
use crate::result::{RedlineError, RedlineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Optional step between navigation and assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Interaction {
    /// Click the first matching element
    Click {
        /// Selector of the element to click
        locator: String,
    },
}

impl Interaction {
    /// Locator the interaction targets
    #[must_use]
    pub fn locator(&self) -> Locator {
        match self {
            Self::Click { locator } => Locator::new(locator),
        }
    }

    fn raw_locator(&self) -> &str {
        match self {
            Self::Click { locator } => locator,
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { .. } => write!(f, "{}.click()", self.locator()),
        }
    }
}

/// A single navigate-and-assert unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Case title
    pub name: String,
    /// Navigation target
    pub goto: String,
    /// Optional interaction before the assertion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<Interaction>,
    /// The single assertion
    pub expect: Expectation,
}

impl TestCase {
    /// Create a case with no interaction
    #[must_use]
    pub fn new(name: impl Into<String>, goto: impl Into<String>, expect: Expectation) -> Self {
        Self {
            name: name.into(),
            goto: goto.into(),
            interact: None,
            expect,
        }
    }

    /// Add an interaction step
    #[must_use]
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interact = Some(interaction);
        self
    }

    /// Assertion kind
    #[must_use]
    pub const fn kind(&self) -> AssertionKind {
        self.expect.kind()
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("case name cannot be empty".to_string());
        }
        if !is_navigable(&self.goto) {
            return Err(format!(
                "case '{}': unsupported navigation target '{}'",
                self.name, self.goto
            ));
        }
        if let Some(interaction) = &self.interact {
            if interaction.raw_locator().trim().is_empty() {
                return Err(format!("case '{}': empty interaction locator", self.name));
            }
        }
        if let Some(locator) = self.expect.raw_locator() {
            if locator.trim().is_empty() {
                return Err(format!("case '{}': empty assertion locator", self.name));
            }
        }
        Ok(())
    }
}

fn is_navigable(url: &str) -> bool {
    ["http://", "https://", "file://", "about:"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

/// A named grouping of test cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    /// Suite title
    #[serde(rename = "suite")]
    pub name: String,
    /// Cases in display order
    pub cases: Vec<TestCase>,
    /// File the suite was loaded from
    #[serde(skip)]
    pub file: String,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            file: file.into(),
        }
    }

    /// Add a test case
    #[must_use]
    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Parse and validate a suite file
    ///
    /// # Errors
    ///
    /// Returns [`RedlineError::FixtureParse`] for malformed YAML and
    /// [`RedlineError::FixtureInvalid`] for structural problems.
    pub fn from_yaml(yaml: &str, file: &str) -> RedlineResult<Self> {
        let mut suite: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| RedlineError::FixtureParse {
                source_name: file.to_string(),
                message: e.to_string(),
            })?;
        suite.file = file.to_string();
        suite.validate()?;
        Ok(suite)
    }

    /// Check structural validity
    ///
    /// # Errors
    ///
    /// Returns [`RedlineError::FixtureInvalid`] naming the first problem.
    pub fn validate(&self) -> RedlineResult<()> {
        let invalid = |message: String| RedlineError::FixtureInvalid {
            source_name: self.file.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("suite name cannot be empty".to_string()));
        }
        if self.cases.is_empty() {
            return Err(invalid(format!("suite '{}' has no cases", self.name)));
        }

        let mut seen = HashSet::new();
        for case in &self.cases {
            case.validate().map_err(invalid)?;
            if !seen.insert(case.name.as_str()) {
                return Err(invalid(format!("duplicate case name '{}'", case.name)));
            }
        }
        Ok(())
    }

    /// Number of cases
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.cases.len()
    }

    /// "Suite › case" title used for filtering and display
    #[must_use]
    pub fn title_path(&self, case: &TestCase) -> String {
        format!("{} › {}", self.name, case.name)
    }
}
