//! Test runner implementation

use crate::commands::{ListArgs, ListFormat, ValidateArgs};
use crate::config::{CliConfig, DriverKind};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use redline::{Registry, Reporter, RunResults, Session, SnapshotSite, TestHarness};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Select fixtures: explicit paths, else the built-in suites, then `--grep`
pub fn load_registry(paths: &[PathBuf], grep: Option<&str>) -> CliResult<Registry> {
    let registry = if paths.is_empty() {
        Registry::builtin()?
    } else {
        Registry::from_paths(paths)?
    };
    let registry = match grep {
        Some(pattern) => registry.filter(pattern)?,
        None => registry,
    };
    if registry.is_empty() {
        return Err(CliError::NoTests {
            filter: grep.map(str::to_string),
        });
    }
    Ok(registry)
}

/// Test runner for executing fixture suites
#[derive(Debug)]
pub struct TestRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl TestRunner {
    /// Create a new test runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
                .with_verbose(config.verbosity.is_verbose());
        Self { config, reporter }
    }

    /// Run tests with optional filter
    ///
    /// Returns the run; whether it went as designed is the caller's exit
    /// decision. Reports configured for the run are written before returning.
    ///
    /// # Errors
    ///
    /// Returns error if fixtures cannot be loaded, the driver cannot start,
    /// or a report cannot be written
    pub fn run(&mut self, grep: Option<&str>) -> CliResult<RunResults> {
        let registry = load_registry(&self.config.fixtures, grep)?;

        self.reporter.header("Running Fixtures");
        self.reporter.info(&format!(
            "{} cases in {} suites ({} driver, {} workers)",
            registry.len(),
            registry.suites().len(),
            driver_name(self.config.driver),
            self.config.effective_workers()
        ));
        self.reporter
            .start_progress(registry.len() as u64, "running cases");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let outcome = runtime.block_on(self.execute(&registry));

        self.reporter.finish();
        let run = outcome?;

        self.reporter.summary(&run);
        self.write_outputs(&run)?;
        Ok(run)
    }

    async fn execute(&self, registry: &Registry) -> CliResult<RunResults> {
        let harness = TestHarness::new(self.config.run_config());
        match self.config.driver {
            DriverKind::Snapshot => {
                let site = Arc::new(self.load_site()?);
                Ok(self.drive(&harness, &site, registry).await)
            }
            DriverKind::Cdp => self.execute_cdp(&harness, registry).await,
        }
    }

    #[cfg(feature = "browser")]
    async fn execute_cdp(&self, harness: &TestHarness, registry: &Registry) -> CliResult<RunResults> {
        let browser = redline::Browser::launch(self.config.browser.clone()).await?;
        let run = self.drive(harness, &browser, registry).await;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }
        Ok(run)
    }

    #[cfg(not(feature = "browser"))]
    async fn execute_cdp(&self, _harness: &TestHarness, _registry: &Registry) -> CliResult<RunResults> {
        Err(redline::RedlineError::BrowserUnavailable.into())
    }

    async fn drive(&self, harness: &TestHarness, session: &dyn Session, registry: &Registry) -> RunResults {
        let expect_pass = self.config.expect_pass;
        harness
            .run(session, registry, |result| {
                self.reporter.case_result(result, expect_pass);
                self.reporter.increment(1);
            })
            .await
    }

    fn load_site(&self) -> CliResult<SnapshotSite> {
        match &self.config.site {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)?;
                Ok(SnapshotSite::from_yaml(&yaml, &path.display().to_string())?)
            }
            None => Ok(SnapshotSite::example_domain()),
        }
    }

    fn write_outputs(&self, run: &RunResults) -> CliResult<()> {
        let reporter = Reporter::new(run);
        for &format in &self.config.reporters {
            let path = reporter
                .write(format, &self.config.output_dir)
                .map_err(|e| CliError::report_generation(format!("{format}: {e}")))?;
            self.reporter
                .info(&format!("{format} report: {}", path.display()));
        }

        if self.config.screenshots {
            let shots = reporter
                .write_screenshots(&self.config.output_dir)
                .map_err(|e| CliError::report_generation(format!("screenshots: {e}")))?;
            if !shots.is_empty() {
                self.reporter.info(&format!("{} screenshots saved", shots.len()));
            }
        }

        if let Some(path) = &self.config.failures_out {
            let count = redline::write_failures(run, path)
                .map_err(|e| CliError::report_generation(format!("failure payloads: {e}")))?;
            self.reporter.info(&format!(
                "{count} failure payloads: {}",
                path.display()
            ));
        }
        Ok(())
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

const fn driver_name(kind: DriverKind) -> &'static str {
    match kind {
        DriverKind::Cdp => "cdp",
        DriverKind::Snapshot => "snapshot",
    }
}

/// Render the `list` command output
pub fn render_list(registry: &Registry, format: ListFormat) -> CliResult<String> {
    match format {
        ListFormat::Text => {
            let mut out = String::new();
            for (suite, case) in registry.cases() {
                out.push_str(&format!(
                    "{}  [{}]  {}\n",
                    suite.title_path(case),
                    case.kind(),
                    suite.file
                ));
            }
            out.push_str(&format!(
                "{} cases in {} suites\n",
                registry.len(),
                registry.suites().len()
            ));
            Ok(out)
        }
        ListFormat::Json => {
            let cases: Vec<_> = registry
                .cases()
                .map(|(suite, case)| {
                    json!({
                        "suite": suite.name,
                        "name": case.name,
                        "file": suite.file,
                        "goto": case.goto,
                        "interaction": case.interact.as_ref().map(ToString::to_string),
                        "assertion": case.kind().to_string(),
                        "locator": case.expect.locator().as_ref().map(ToString::to_string),
                        "expected": case.expect.expected_value(),
                    })
                })
                .collect();
            pretty_json(&cases)
        }
    }
}

fn pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value).map_err(redline::RedlineError::from)?)
}

/// `list` command
pub fn list(args: &ListArgs, config: &CliConfig) -> CliResult<String> {
    let paths = if args.paths.is_empty() {
        &config.fixtures
    } else {
        &args.paths
    };
    let registry = load_registry(paths, args.grep.as_deref())?;
    render_list(&registry, args.format)
}

/// `validate` command: every file must load and pass validation
pub fn validate(args: &ValidateArgs) -> CliResult<String> {
    let registry = Registry::from_paths(&args.paths)?;
    if registry.is_empty() {
        return Err(CliError::NoTests { filter: None });
    }
    Ok(format!(
        "{} suites, {} cases OK",
        registry.suites().len(),
        registry.len()
    ))
}
