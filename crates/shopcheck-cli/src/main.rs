//! Shopcheck CLI: run the storefront suite from the command line
//!
//! ## Usage
//!
//! ```bash
//! shopcheck run                          # Every scenario on the default browser
//! shopcheck run --browser chrome -f cart # Cart scenarios on Chrome
//! shopcheck list                         # Scenario names
//! shopcheck credentials                  # Write data/credentials.csv
//! ```

use clap::Parser;
use shopcheck::credentials::write_default_credentials;
use shopcheck::telemetry::{init_logging, LogConfig};
use shopcheck_cli::{
    list_lines, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, CredentialsArgs,
    ListArgs, ReportPrinter, RunArgs, SuiteRunner, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Commands::Run(args) => run_suite(config, &args),
        Commands::List(args) => run_list(&args),
        Commands::Credentials(args) => run_credentials(config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
}

fn run_suite(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let log_file = init_logging(&LogConfig::default().with_level(config.verbosity.log_level()))?;
    tracing::debug!("Logging to {}", log_file.display());

    let runner = SuiteRunner::new(config);
    let report = runner.run(args)?;

    let printer = ReportPrinter::new(config.color.should_color(), config.verbosity.is_quiet());
    println!("{}", printer.render(&report, args.format)?);

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::suite_failed(format!(
            "{} scenario(s) failed",
            report.failed()
        )))
    }
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    for line in list_lines(args)? {
        println!("{line}");
    }
    Ok(())
}

fn run_credentials(config: CliConfig, args: &CredentialsArgs) -> CliResult<()> {
    let rows = write_default_credentials(&args.output)?;
    if !config.verbosity.is_quiet() {
        println!("Wrote {rows} credential cases to {}", args.output.display());
    }
    Ok(())
}
