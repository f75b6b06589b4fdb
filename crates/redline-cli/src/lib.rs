//! Redline CLI library
//!
//! Command-line front end for running, listing and validating fixture
//! suites. The binary in `main.rs` is a thin wrapper over these modules.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ListArgs, ListFormat, ReporterArg, TestArgs, ValidateArgs,
};
pub use config::{CliConfig, ColorChoice, DriverKind, Verbosity, PROJECT_FILE};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{list, load_registry, render_list, validate, TestRunner};
