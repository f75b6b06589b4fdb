//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use redline::{RunResults, TestResult, TestStatus};

/// Progress reporter for fixture runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Draw a progress bar; set when stderr is a terminal
    interactive: bool,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print full failure messages
    pub verbose: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        let term = Term::stderr();
        let interactive = term.is_term();
        Self {
            term,
            progress_bar: None,
            interactive,
            use_color,
            quiet,
            verbose: false,
        }
    }

    /// Print full failure messages under each case
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn line(&self, text: &str) {
        match &self.progress_bar {
            Some(pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn prefix(&self, symbol: &str, plain: &str, color: &Style) -> String {
        if self.use_color {
            color.apply_to(symbol).bold().to_string()
        } else {
            plain.to_string()
        }
    }

    /// Start a progress bar for multiple cases
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.interactive {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "PASS", &Style::new().green());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        let prefix = self.prefix("✗", "FAIL", &Style::new().red());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", &Style::new().yellow());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", &Style::new().blue());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line("");
        self.line(&styled);
    }

    /// Print one finished case
    ///
    /// Failures are the designed outcome, so in quiet mode only unexpected
    /// verdicts are printed.
    pub fn case_result(&self, result: &TestResult, expect_pass: bool) {
        if self.quiet && !result.is_unexpected(expect_pass) {
            return;
        }
        let label = format!(
            "{} ({}ms)",
            result.title(),
            result.duration.as_millis()
        );
        match result.status {
            TestStatus::Passed => self.success(&label),
            TestStatus::Skipped => {
                if !self.quiet {
                    let prefix = self.prefix("-", "SKIP", &Style::new().yellow());
                    self.line(&format!("{prefix} {label}"));
                }
            }
            TestStatus::Failed | TestStatus::TimedOut => {
                self.failure(&label);
                if let Some(message) = result.failure_message() {
                    let shown: Vec<&str> = if self.verbose {
                        message.lines().collect()
                    } else {
                        message.lines().take(1).collect()
                    };
                    for text in shown {
                        self.line(&format!("    {text}"));
                    }
                }
            }
        }
    }

    /// Print run summary
    pub fn summary(&self, run: &RunResults) {
        let designed = run.as_designed();
        if self.quiet && designed {
            return;
        }

        let passed = run.passed_count();
        let failed = run.failed_count();
        let skipped = run.skipped_count();
        let secs = run.duration.as_secs_f64();
        let (verdict, verdict_style) = if designed {
            ("AS DESIGNED", Style::new().green().bold())
        } else {
            ("UNEXPECTED", Style::new().red().bold())
        };

        self.line("");
        if self.use_color {
            self.line(&format!(
                "{} {} cases in {secs:.2}s ({} failed, {} passed, {} skipped) [{}]",
                verdict_style.apply_to(verdict),
                run.total(),
                Style::new().red().apply_to(failed),
                Style::new().green().apply_to(passed),
                Style::new().yellow().apply_to(skipped),
                run.driver
            ));
        } else {
            self.line(&format!(
                "{verdict} {} cases in {secs:.2}s ({failed} failed, {passed} passed, {skipped} skipped) [{}]",
                run.total(),
                run.driver
            ));
        }

        for result in run.unexpected() {
            let what = if run.expect_pass { "failed" } else { "passed" };
            self.warning(&format!("unexpectedly {what}: {}", result.title()));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
            assert!(!reporter.verbose);
        }

        #[test]
        fn test_with_verbose() {
            let reporter = ProgressReporter::new(false, false).with_verbose(true);
            assert!(reporter.verbose);
        }

        #[test]
        fn test_plain_prefixes() {
            let reporter = ProgressReporter::new(false, false);
            assert_eq!(reporter.prefix("✓", "PASS", &Style::new().green()), "PASS");
        }

        #[test]
        fn test_progress_bar_lifecycle() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.interactive = true;
            reporter.start_progress(10, "Running cases");

            let pb = reporter.progress_bar.clone().expect("bar on a terminal");
            assert_eq!(pb.length(), Some(10));
            reporter.increment(3);
            assert_eq!(pb.position(), 3);
            reporter.info("printed above the bar");

            reporter.finish();
            assert!(reporter.progress_bar.is_none());
            assert!(pb.is_finished());
        }

        #[test]
        fn test_no_progress_bar_off_terminal() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.interactive = false;
            reporter.start_progress(10, "Running cases");
            assert!(reporter.progress_bar.is_none());
            reporter.increment(1);
        }

        #[test]
        fn test_quiet_mode_has_no_progress_bar() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.interactive = true;
            reporter.start_progress(10, "Running cases");
            assert!(reporter.progress_bar.is_none());
            reporter.failure("shown");
        }
    }
}
