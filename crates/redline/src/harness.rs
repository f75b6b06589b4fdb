//! Test harness for running fixture suites.
//!
//! Each case gets a fresh page from the [`Session`], runs
//! navigate → optional click → one expectation, and closes the page. Cases
//! share nothing, so they may run concurrently up to `workers`.

use crate::case::{Suite, TestCase};
use crate::driver::{PageDriver, Session};
use crate::expect::{AssertionOutcome, ExpectOptions};
use crate::registry::Registry;
use crate::result::{RedlineError, RedlineResult};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default per-case timeout (30 seconds)
pub const DEFAULT_CASE_TIMEOUT_MS: u64 = 30_000;

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Concurrent cases
    pub workers: usize,
    /// Per-case timeout in milliseconds (0 = none)
    pub case_timeout_ms: u64,
    /// Expect auto-wait
    pub expect: ExpectOptions,
    /// Stop scheduling cases after the first unexpected verdict
    pub fail_fast: bool,
    /// Capture a screenshot of failing cases
    pub screenshots: bool,
    /// Conventional semantics: cases are expected to pass
    pub expect_pass: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            case_timeout_ms: DEFAULT_CASE_TIMEOUT_MS,
            expect: ExpectOptions::default(),
            fail_fast: false,
            screenshots: false,
            expect_pass: false,
        }
    }
}

impl RunConfig {
    /// Set worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set per-case timeout
    #[must_use]
    pub const fn with_case_timeout(mut self, ms: u64) -> Self {
        self.case_timeout_ms = ms;
        self
    }

    /// Set expect options
    #[must_use]
    pub const fn with_expect(mut self, expect: ExpectOptions) -> Self {
        self.expect = expect;
        self
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Enable failure screenshots
    #[must_use]
    pub const fn with_screenshots(mut self) -> Self {
        self.screenshots = true;
        self
    }

    /// Expect cases to pass instead of fail
    #[must_use]
    pub const fn with_expect_pass(mut self) -> Self {
        self.expect_pass = true;
        self
    }
}

/// Final status of a case, named as in Playwright reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    /// Assertion held
    Passed,
    /// Assertion mismatch or driver error
    Failed,
    /// Per-case timeout exceeded
    TimedOut,
    /// Not run (fail-fast)
    Skipped,
}

impl TestStatus {
    /// Report name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedOut",
            Self::Skipped => "skipped",
        }
    }

    /// Failed or timed out
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running a single case
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Suite name
    pub suite: String,
    /// Fixture file
    pub file: String,
    /// Case name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Wall time
    pub duration: Duration,
    /// Assertion outcome, when the assertion was reached
    pub outcome: Option<AssertionOutcome>,
    /// Driver error, when the assertion was not reached
    pub error: Option<String>,
    /// Steps performed, in order
    pub log: Vec<String>,
    /// PNG screenshot of the failing page
    pub screenshot: Option<Vec<u8>>,
}

impl TestResult {
    fn new(suite: &Suite, case: &TestCase, status: TestStatus) -> Self {
        Self {
            suite: suite.name.clone(),
            file: suite.file.clone(),
            name: case.name.clone(),
            status,
            duration: Duration::ZERO,
            outcome: None,
            error: None,
            log: Vec::new(),
            screenshot: None,
        }
    }

    fn record_error(&mut self, e: &RedlineError) {
        if e.is_timeout() {
            self.status = TestStatus::TimedOut;
        }
        self.error = Some(e.to_string());
    }

    /// A case that was not run
    #[must_use]
    pub fn skipped(suite: &Suite, case: &TestCase) -> Self {
        Self::new(suite, case, TestStatus::Skipped)
    }

    /// "Suite › case"
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} › {}", self.suite, self.name)
    }

    /// Whether the assertion held
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    /// Failure text: the assertion message or the driver error
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        if !self.status.is_failure() {
            return None;
        }
        self.outcome
            .as_ref()
            .filter(|o| !o.passed)
            .map(|o| o.message.as_str())
            .or(self.error.as_deref())
    }

    /// Whether this verdict contradicts the run's expectation
    #[must_use]
    pub fn is_unexpected(&self, expect_pass: bool) -> bool {
        if expect_pass {
            self.status.is_failure()
        } else {
            self.passed()
        }
    }
}

/// Results of a whole run
#[derive(Debug, Clone)]
pub struct RunResults {
    /// Per-case results in registry order
    pub results: Vec<TestResult>,
    /// Total wall time
    pub duration: Duration,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Driver name
    pub driver: String,
    /// Whether cases were expected to pass
    pub expect_pass: bool,
}

impl RunResults {
    /// Total case count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Count passed cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Count failed and timed-out cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Count skipped cases
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Skipped)
            .count()
    }

    /// Failed and timed-out cases
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results
            .iter()
            .filter(|r| r.status.is_failure())
            .collect()
    }

    /// Cases whose verdict contradicts the run's expectation
    #[must_use]
    pub fn unexpected(&self) -> Vec<&TestResult> {
        self.results
            .iter()
            .filter(|r| r.is_unexpected(self.expect_pass))
            .collect()
    }

    /// Whether every executed case behaved as designed
    #[must_use]
    pub fn as_designed(&self) -> bool {
        self.unexpected().is_empty()
    }
}

/// Test harness for running suites
#[derive(Debug, Default)]
pub struct TestHarness {
    config: RunConfig,
}

impl TestHarness {
    /// Create a harness
    #[must_use]
    pub const fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one case on a fresh page
    ///
    /// Opening the page and the case body share the case timeout. The
    /// screenshot and closing the page are each bounded by it again.
    pub async fn run_case(&self, session: &dyn Session, suite: &Suite, case: &TestCase) -> TestResult {
        let start = Instant::now();
        let mut result = TestResult::new(suite, case, TestStatus::Failed);
        let deadline = self.deadline();

        match self.bounded(deadline, session.new_page()).await {
            Ok(mut page) => {
                let body = self.execute(page.as_mut(), case, &mut result.log);
                match self.bounded(deadline, body).await {
                    Ok(outcome) => {
                        if outcome.passed {
                            result.status = TestStatus::Passed;
                        }
                        result.outcome = Some(outcome);
                    }
                    Err(e) => result.record_error(&e),
                }

                if self.config.screenshots && result.status.is_failure() {
                    match self.bounded(self.deadline(), page.screenshot()).await {
                        Ok(png) => result.screenshot = Some(png),
                        Err(e) => tracing::warn!(case = %case.name, error = %e, "screenshot failed"),
                    }
                }

                if let Err(e) = self.bounded(self.deadline(), page.close()).await {
                    tracing::warn!(case = %case.name, error = %e, "failed to close page");
                }
            }
            Err(e) => result.record_error(&e),
        }

        result.duration = start.elapsed();
        tracing::info!(
            case = %result.title(),
            status = %result.status,
            duration = ?result.duration,
            "case finished"
        );
        result
    }

    /// Case deadline from now, `None` when the case timeout is 0
    fn deadline(&self) -> Option<tokio::time::Instant> {
        (self.config.case_timeout_ms != 0).then(|| {
            tokio::time::Instant::now() + Duration::from_millis(self.config.case_timeout_ms)
        })
    }

    async fn bounded<T, F>(&self, deadline: Option<tokio::time::Instant>, fut: F) -> RedlineResult<T>
    where
        F: std::future::Future<Output = RedlineResult<T>>,
    {
        match deadline {
            None => fut.await,
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .unwrap_or(Err(RedlineError::Timeout {
                    ms: self.config.case_timeout_ms,
                })),
        }
    }

    async fn execute(
        &self,
        page: &mut dyn PageDriver,
        case: &TestCase,
        log: &mut Vec<String>,
    ) -> RedlineResult<AssertionOutcome> {
        tracing::debug!(url = %case.goto, "navigate");
        log.push(format!("navigating to \"{}\"", case.goto));
        page.goto(&case.goto).await?;

        if let Some(interaction) = &case.interact {
            tracing::debug!(action = %interaction, "interact");
            log.push(interaction.to_string());
            page.click(interaction.locator().selector()).await?;
        }

        log.push(case.expect.call());
        case.expect.evaluate(page, &self.config.expect).await
    }

    /// Run every case in the registry
    ///
    /// `on_result` is called as each case finishes; the returned results are
    /// in registry order.
    pub async fn run<F>(&self, session: &dyn Session, registry: &Registry, mut on_result: F) -> RunResults
    where
        F: FnMut(&TestResult),
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let stop = AtomicBool::new(false);
        let stop = &stop;

        tracing::info!(
            cases = registry.len(),
            workers = self.config.workers,
            driver = session.name(),
            "starting run"
        );

        let mut pending = stream::iter(registry.cases().enumerate())
            .map(|(index, (suite, case))| async move {
                if stop.load(Ordering::SeqCst) {
                    return (index, TestResult::skipped(suite, case));
                }
                let result = self.run_case(session, suite, case).await;
                if self.config.fail_fast && result.is_unexpected(self.config.expect_pass) {
                    stop.store(true, Ordering::SeqCst);
                }
                (index, result)
            })
            .buffer_unordered(self.config.workers.max(1));

        let mut results = Vec::with_capacity(registry.len());
        while let Some((index, result)) = pending.next().await {
            on_result(&result);
            results.push((index, result));
        }
        results.sort_by_key(|(index, _)| *index);

        RunResults {
            results: results.into_iter().map(|(_, result)| result).collect(),
            duration: start.elapsed(),
            started_at,
            driver: session.name().to_string(),
            expect_pass: self.config.expect_pass,
        }
    }
}
