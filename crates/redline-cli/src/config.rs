//! CLI configuration
//!
//! Layered: built-in defaults, then an optional `redline.yaml` project file,
//! then command-line flags.

use crate::commands::TestArgs;
use crate::error::{CliError, CliResult};
use clap::ValueEnum;
use redline::{BrowserConfig, ExpectOptions, ReportFormat, RunConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project file looked up in the working directory
pub const PROJECT_FILE: &str = "redline.yaml";

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default `tracing` filter for this level
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Page driver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Real Chromium over CDP
    #[default]
    Cdp,
    /// Offline page snapshots
    Snapshot,
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Verbosity level
    #[serde(skip)]
    pub verbosity: Verbosity,
    /// Color output choice
    #[serde(skip)]
    pub color: ColorChoice,
    /// Page driver
    pub driver: DriverKind,
    /// Snapshot site file (snapshot driver; None = built-in example.com)
    pub site: Option<PathBuf>,
    /// Fixture files or directories (empty = built-in suites)
    pub fixtures: Vec<PathBuf>,
    /// Number of concurrent cases (0 = auto-detect)
    pub workers: usize,
    /// Per-case timeout in milliseconds
    pub timeout_ms: u64,
    /// Expect auto-wait in milliseconds
    pub expect_timeout_ms: u64,
    /// Expect polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Stop after the first unexpected verdict
    pub fail_fast: bool,
    /// Conventional semantics: fail the run on any failing case
    pub expect_pass: bool,
    /// Capture screenshots of failing cases
    pub screenshots: bool,
    /// Output directory for reports
    pub output_dir: PathBuf,
    /// Report files to write
    pub reporters: Vec<ReportFormat>,
    /// Triage payload export file
    pub failures_out: Option<PathBuf>,
    /// Browser settings (cdp driver)
    pub browser: BrowserConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            driver: DriverKind::default(),
            site: None,
            fixtures: Vec::new(),
            workers: run.workers,
            timeout_ms: run.case_timeout_ms,
            expect_timeout_ms: run.expect.timeout_ms,
            poll_interval_ms: run.expect.poll_interval_ms,
            fail_fast: false,
            expect_pass: false,
            screenshots: false,
            output_dir: PathBuf::from("target/redline"),
            reporters: Vec::new(),
            failures_out: None,
            browser: BrowserConfig::default(),
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a project file
    ///
    /// Keys left out keep their defaults.
    pub fn from_yaml(yaml: &str, source: &Path) -> CliResult<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| CliError::config(format!("{}: {e}", source.display())))
    }

    /// Load the project file layer
    ///
    /// An explicit path must exist; otherwise `redline.yaml` in `dir` is used
    /// when present. Returns the config and the file it came from.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> CliResult<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let candidate = dir.join(PROJECT_FILE);
                if !candidate.is_file() {
                    return Ok((Self::default(), None));
                }
                candidate
            }
        };
        let yaml = std::fs::read_to_string(&path)?;
        tracing::debug!(path = %path.display(), "loaded project config");
        Ok((Self::from_yaml(&yaml, &path)?, Some(path)))
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Layer `test` command flags over this config
    ///
    /// Only flags the user actually gave override the file layer.
    #[must_use]
    pub fn with_test_args(mut self, args: &TestArgs) -> Self {
        if !args.paths.is_empty() {
            self.fixtures.clone_from(&args.paths);
        }
        if let Some(driver) = args.driver {
            self.driver = driver;
        }
        if let Some(site) = &args.site {
            self.site = Some(site.clone());
        }
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
        if let Some(ms) = args.timeout {
            self.timeout_ms = ms;
        }
        if let Some(ms) = args.expect_timeout {
            self.expect_timeout_ms = ms;
        }
        if !args.reporters.is_empty() {
            self.reporters = args.reporters.iter().map(|&r| r.into()).collect();
        }
        if let Some(dir) = &args.output {
            self.output_dir = dir.clone();
        }
        if let Some(path) = &args.failures_out {
            self.failures_out = Some(path.clone());
        }
        if let Some(path) = &args.chromium {
            self.browser.chromium_path = Some(path.clone());
        }
        self.fail_fast |= args.fail_fast;
        self.expect_pass |= args.expect_pass;
        self.screenshots |= args.screenshots;
        if args.headed {
            self.browser.headless = false;
        }
        if args.no_sandbox {
            self.browser.sandbox = false;
        }
        self
    }

    /// Get effective number of workers
    #[must_use]
    #[allow(clippy::redundant_closure_for_method_calls)]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.workers
        }
    }

    /// Harness configuration
    #[must_use]
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            workers: self.effective_workers(),
            case_timeout_ms: self.timeout_ms,
            expect: ExpectOptions::default()
                .with_timeout(self.expect_timeout_ms)
                .with_poll_interval(self.poll_interval_ms),
            fail_fast: self.fail_fast,
            screenshots: self.screenshots,
            expect_pass: self.expect_pass,
        }
    }

    /// Effective configuration as YAML
    pub fn to_yaml(&self) -> CliResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| CliError::config(e.to_string()))
    }
}
