//! Redline CLI: run browser fixture suites whose assertions fail on purpose
//!
//! ## Usage
//!
//! ```bash
//! redline test                          # Run the built-in suites
//! redline test suites/ --grep Login     # Filter by "Suite › case"
//! redline test --reporter json -o out   # Write out/results.json
//! redline list --format json            # Show cases without running
//! redline validate suites/              # Check fixture files
//! ```
//!
//! Exit codes: 0 when every case failed as designed (or passed, with
//! `--expect-pass`), 1 otherwise, 2 on configuration or driver errors.

use clap::Parser;
use redline_cli::{
    list, validate, Cli, CliConfig, CliResult, ColorChoice, Commands, TestRunner, Verbosity,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(verbosity(&cli));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let (config, source) = build_config(&cli)?;

    match cli.command {
        Commands::Test(args) => {
            let mut runner = TestRunner::new(config.with_test_args(&args));
            let results = runner.run(args.grep.as_deref())?;
            Ok(if results.as_designed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::List(args) => {
            print!("{}", list(&args, &config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate(args) => {
            println!("{}", validate(&args)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            match source {
                Some(path) => println!("# source: {}", path.display()),
                None => println!("# source: built-in defaults"),
            }
            print!("{}", config.to_yaml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn verbosity(cli: &Cli) -> Verbosity {
    if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }
}

/// Defaults, then the project file, then global flags
fn build_config(cli: &Cli) -> CliResult<(CliConfig, Option<PathBuf>)> {
    let cwd = std::env::current_dir()?;
    let (config, source) = CliConfig::load(cli.config.as_deref(), &cwd)?;
    let color: ColorChoice = cli.color.into();
    Ok((
        config.with_verbosity(verbosity(cli)).with_color(color),
        source,
    ))
}
