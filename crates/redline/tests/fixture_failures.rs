//! The shipped fixtures must all fail against the target page, the same way
//! every time, whatever subset or order they run in.

#![allow(clippy::unwrap_used)]

use redline::{
    AssertionKind, ExpectOptions, Registry, RunConfig, RunResults, SnapshotSite, TestHarness,
    TestStatus,
};
use std::collections::HashMap;
use std::sync::Arc;

fn harness(workers: usize) -> TestHarness {
    TestHarness::new(
        RunConfig::default()
            .with_workers(workers)
            .with_expect(ExpectOptions::default().with_timeout(0)),
    )
}

async fn run(registry: &Registry, workers: usize) -> RunResults {
    let site = Arc::new(SnapshotSite::example_domain());
    harness(workers).run(&site, registry, |_| {}).await
}

fn received_by_title(results: &RunResults) -> HashMap<String, (TestStatus, String)> {
    results
        .results
        .iter()
        .map(|r| {
            let received = r
                .outcome
                .as_ref()
                .map(|o| o.received.clone())
                .unwrap_or_default();
            (r.title(), (r.status, received))
        })
        .collect()
}

#[tokio::test]
async fn every_builtin_case_fails() {
    let registry = Registry::builtin().unwrap();
    let results = run(&registry, 1).await;

    assert_eq!(results.total(), 15);
    assert_eq!(results.failed_count(), 15);
    assert_eq!(results.passed_count(), 0);
    assert!(results.as_designed());
    for result in &results.results {
        let outcome = result.outcome.as_ref().unwrap();
        assert!(!outcome.passed, "{} passed", result.title());
        assert!(result.error.is_none(), "{} errored", result.title());
    }
}

#[tokio::test]
async fn title_case_reports_actual_title() {
    let registry = Registry::builtin()
        .unwrap()
        .filter("Demo Failure Tests › should fail - incorrect page title")
        .unwrap();
    let results = run(&registry, 1).await;
    let outcome = results.results[0].outcome.as_ref().unwrap();

    assert_eq!(outcome.kind, AssertionKind::TitleEquals);
    assert_eq!(outcome.expected, "\"Welcome to Example Website\"");
    assert_eq!(outcome.received, "\"Example Domain\"");
}

#[tokio::test]
async fn paragraph_count_reports_two() {
    let registry = Registry::builtin()
        .unwrap()
        .filter("element count assertion")
        .unwrap();
    let results = run(&registry, 1).await;
    let outcome = results.results[0].outcome.as_ref().unwrap();

    assert_eq!(outcome.expected, "5");
    assert_eq!(outcome.received, "2");
    assert_eq!(outcome.locator.as_deref(), Some("locator('p')"));
}

#[tokio::test]
async fn click_case_lands_on_iana() {
    let registry = Registry::builtin()
        .unwrap()
        .filter("incorrect URL navigation")
        .unwrap();
    let results = run(&registry, 1).await;
    let outcome = results.results[0].outcome.as_ref().unwrap();

    assert_eq!(outcome.kind, AssertionKind::UrlEquals);
    assert_eq!(
        outcome.received,
        "\"https://www.iana.org/help/example-domains\""
    );
}

#[tokio::test]
async fn subsets_and_order_do_not_change_outcomes() {
    let full = received_by_title(&run(&Registry::builtin().unwrap(), 1).await);

    let subset = Registry::builtin().unwrap().filter("Login|Search").unwrap();
    for (title, outcome) in received_by_title(&run(&subset, 1).await) {
        assert_eq!(full[&title], outcome, "{title}");
    }

    let mut reversed = Registry::new();
    for suite in Registry::builtin().unwrap().suites().iter().rev() {
        let mut suite = suite.clone();
        suite.cases.reverse();
        reversed = reversed.with_suite(suite);
    }
    assert_eq!(received_by_title(&run(&reversed, 4).await), full);
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let registry = Registry::builtin().unwrap();
    let first = run(&registry, 3).await;
    let second = run(&registry, 3).await;

    let messages = |r: &RunResults| -> Vec<String> {
        r.results
            .iter()
            .map(|t| t.failure_message().unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(messages(&first), messages(&second));
    assert_eq!(received_by_title(&first), received_by_title(&second));
}

#[tokio::test]
async fn triage_payloads_cover_every_failure() {
    let registry = Registry::builtin().unwrap();
    let results = run(&registry, 2).await;
    let payloads = redline::failures(&results);

    assert_eq!(payloads.len(), 15);
    let checkout = payloads
        .iter()
        .find(|p| p.test_name == "should fail - checkout button disabled")
        .unwrap();
    assert_eq!(checkout.file_path, "checkout.spec.yaml");
    assert_eq!(checkout.triage_label, "Assertion: Element Not Enabled");
    assert!(checkout
        .error_message
        .contains("Received: <element(s) not found>"));
}
