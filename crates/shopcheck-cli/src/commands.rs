//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use shopcheck::config::{env, DEFAULT_CREDENTIALS_PATH};
use shopcheck::BrowserKind;
use std::path::PathBuf;

/// Shopcheck: UI regression suite for the Sauce Demo store
#[derive(Parser, Debug)]
#[command(name = "shopcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and failures only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the suite against a real browser
    Run(RunArgs),

    /// List scenario names
    List(ListArgs),

    /// Write the default credentials CSV
    Credentials(CredentialsArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Browser to drive (chrome or edge)
    #[arg(short, long, env = env::DEFAULT_BROWSER, value_parser = parse_browser)]
    pub browser: Option<BrowserKind>,

    /// Store URL
    #[arg(long, env = env::BASE_URL)]
    pub base_url: Option<String>,

    /// Run without a visible window (also enabled by a truthy HEADLESS)
    #[arg(long)]
    pub headless: bool,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Credential cases file
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
    pub credentials: PathBuf,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Credential cases file
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
    pub credentials: PathBuf,
}

/// Arguments for the credentials command
#[derive(Parser, Debug)]
pub struct CredentialsArgs {
    /// Where to write the file
    #[arg(short, long, default_value = DEFAULT_CREDENTIALS_PATH)]
    pub output: PathBuf,
}

/// Suite report format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per scenario and a summary
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Color output argument
#[derive(ValueEnum, Debug, Clone, Default)]
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

fn parse_browser(value: &str) -> Result<BrowserKind, String> {
    value.parse().map_err(|e: shopcheck::ProbeError| e.to_string())
}
