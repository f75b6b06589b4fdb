//! Redline: browser fixture suites that fail on purpose
//!
//! Each fixture case navigates to a fixed URL, optionally clicks, and makes
//! one Playwright-style assertion whose expected value is known to be wrong.
//! The failures are the product: they become sample input for a bug triage
//! engine.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌──────────────────┐
//! │ Registry   │    │ Test       │    │ PageDriver       │
//! │ (*.spec.   │───►│ Harness    │───►│ cdp | snapshot   │
//! │  yaml)     │    │ + expect   │    │                  │
//! └────────────┘    └─────┬──────┘    └──────────────────┘
//!                         │
//!                         ▼
//!              ┌──────────────────────┐
//!              │ Reporter / triage    │
//!              │ json, junit, html    │
//!              └──────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod case;
mod driver;
mod expect;
mod harness;
mod locator;
mod registry;
mod reporter;
mod result;
mod snapshot;
mod triage;

pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::{Browser, Page};
pub use case::{Interaction, Suite, TestCase};
pub use driver::{PageDriver, Session};
pub use expect::{
    AssertionKind, AssertionOutcome, ExpectOptions, Expectation, DEFAULT_EXPECT_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS, NOT_FOUND,
};
pub use harness::{RunConfig, RunResults, TestHarness, TestResult, TestStatus, DEFAULT_CASE_TIMEOUT_MS};
pub use locator::{normalize_whitespace, ElementProbe, Locator, Selector};
pub use registry::{Registry, FIXTURE_PATTERNS};
pub use reporter::{stack_trace, ReportFormat, Reporter};
pub use result::{RedlineError, RedlineResult};
pub use snapshot::{normalize_url, PageSnapshot, SnapshotElement, SnapshotPage, SnapshotSite};
pub use triage::{detect_label, failures, write_failures, FailurePayload, DEFAULT_LABELS};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        AssertionKind, Expectation, PageDriver, Registry, Reporter, RunConfig, Session,
        SnapshotSite, Suite, TestCase, TestHarness, TestStatus,
    };
}
