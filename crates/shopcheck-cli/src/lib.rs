//! Shopcheck CLI Library
//!
//! Command-line interface for the Shopcheck storefront suite.

#![warn(missing_docs)]
#![allow(clippy::format_push_string)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, CredentialsArgs, ListArgs, ReportFormat, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ReportPrinter;
pub use runner::{build_suite, list_lines, SuiteRunner};
