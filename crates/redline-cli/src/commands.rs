//! CLI command definitions using clap

use crate::config::DriverKind;
use clap::{Parser, Subcommand, ValueEnum};
use redline::ReportFormat;
use std::path::PathBuf;

/// Redline: run browser fixture suites whose assertions fail on purpose
#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Project config file (default: ./redline.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run fixture suites
    Test(TestArgs),

    /// List fixture cases without running them
    List(ListArgs),

    /// Load and validate fixture files
    Validate(ValidateArgs),

    /// Show the effective configuration
    Config,
}

/// Arguments for the test command
#[derive(Parser, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct TestArgs {
    /// Fixture files or directories (default: built-in suites)
    pub paths: Vec<PathBuf>,

    /// Only run cases whose "Suite › case" title matches this regex
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Page driver
    #[arg(long)]
    pub driver: Option<DriverKind>,

    /// Snapshot site file for the snapshot driver
    #[arg(long)]
    pub site: Option<PathBuf>,

    /// Number of concurrent cases (0 = auto)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Stop after the first unexpected verdict
    #[arg(long)]
    pub fail_fast: bool,

    /// Expect cases to pass (exit non-zero on any failure)
    #[arg(long)]
    pub expect_pass: bool,

    /// Per-case timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Expect auto-wait timeout in milliseconds
    #[arg(long)]
    pub expect_timeout: Option<u64>,

    /// Report files to write (repeatable)
    #[arg(long = "reporter", value_name = "FORMAT")]
    pub reporters: Vec<ReporterArg>,

    /// Output directory for reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write triage failure payloads (JSON array) to this file
    #[arg(long, value_name = "FILE")]
    pub failures_out: Option<PathBuf>,

    /// Capture screenshots of failing cases (cdp driver)
    #[arg(long)]
    pub screenshots: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Path to the Chromium binary
    #[arg(long, value_name = "PATH")]
    pub chromium: Option<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Fixture files or directories (default: built-in suites)
    pub paths: Vec<PathBuf>,

    /// Only list cases whose "Suite › case" title matches this regex
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ListFormat,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Fixture files or directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReporterArg {
    /// Playwright JSON reporter shape
    Json,
    /// JUnit XML for CI systems
    Junit,
    /// Standalone HTML page
    Html,
}

impl From<ReporterArg> for ReportFormat {
    fn from(arg: ReporterArg) -> Self {
        match arg {
            ReporterArg::Json => Self::Json,
            ReporterArg::Junit => Self::Junit,
            ReporterArg::Html => Self::Html,
        }
    }
}

/// List output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One line per case
    #[default]
    Text,
    /// JSON array of cases
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_test_command() {
            let cli = Cli::parse_from(["redline", "test"]);
            if let Commands::Test(args) = cli.command {
                assert!(args.paths.is_empty());
                assert!(args.driver.is_none());
            } else {
                panic!("expected Test command");
            }
        }

        #[test]
        fn test_parse_test_flags() {
            let cli = Cli::parse_from([
                "redline",
                "test",
                "suites/",
                "--driver",
                "snapshot",
                "-j",
                "4",
                "--grep",
                "Login",
                "--reporter",
                "json",
                "--reporter",
                "junit",
                "--failures-out",
                "out/failures.json",
                "--expect-pass",
            ]);
            if let Commands::Test(args) = cli.command {
                assert_eq!(args.paths, [PathBuf::from("suites/")]);
                assert_eq!(args.driver, Some(DriverKind::Snapshot));
                assert_eq!(args.workers, Some(4));
                assert_eq!(args.grep.as_deref(), Some("Login"));
                assert_eq!(args.reporters, [ReporterArg::Json, ReporterArg::Junit]);
                assert_eq!(args.failures_out, Some(PathBuf::from("out/failures.json")));
                assert!(args.expect_pass);
            } else {
                panic!("expected Test command");
            }
        }

        #[test]
        fn test_parse_list_json() {
            let cli = Cli::parse_from(["redline", "list", "--format", "json"]);
            if let Commands::List(args) = cli.command {
                assert_eq!(args.format, ListFormat::Json);
            } else {
                panic!("expected List command");
            }
        }

        #[test]
        fn test_validate_requires_paths() {
            assert!(Cli::try_parse_from(["redline", "validate"]).is_err());
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["redline", "config", "-vv", "--config", "x.yaml"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
            assert!(matches!(cli.command, Commands::Config));
        }

        #[test]
        fn test_reporter_arg_into_format() {
            assert_eq!(ReportFormat::from(ReporterArg::Html), ReportFormat::Html);
        }
    }
}
