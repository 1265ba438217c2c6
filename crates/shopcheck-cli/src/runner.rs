//! Suite execution behind the `run` and `list` commands

use crate::commands::{ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use shopcheck::{
    run_suite, CredentialsSource, DriverBinaryLocator, ProbeConfig, SessionProvider, Suite,
    SuiteReport, Telemetry,
};
use std::path::Path;

/// Runs the suite against a real browser
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
}

impl SuiteRunner {
    /// Create a new runner
    #[must_use]
    pub const fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// CLI configuration
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Environment settings with the command-line overrides applied
    pub fn probe_config(args: &RunArgs) -> CliResult<ProbeConfig> {
        let mut config = ProbeConfig::from_env()?;
        if let Some(url) = &args.base_url {
            config = config.with_base_url(url)?;
        }
        if let Some(browser) = args.browser {
            config = config.with_browser(browser);
        }
        let headless = args.headless || config.headless;
        Ok(config
            .with_headless(headless)
            .with_credentials_path(&args.credentials))
    }

    /// Run every selected scenario and return the report
    pub fn run(&self, args: &RunArgs) -> CliResult<SuiteReport> {
        let probe = Self::probe_config(args)?;
        let suite = build_suite(args.filter.as_deref(), &probe.credentials_path)?;
        if suite.is_empty() && suite.skipped().is_empty() {
            return Err(CliError::config(format!(
                "no scenario matches {:?}",
                args.filter.as_deref().unwrap_or_default()
            )));
        }

        let project_root = std::env::current_dir()?;
        let provider = SessionProvider::new(DriverBinaryLocator::new(project_root));
        let telemetry = Telemetry::new(&probe.screenshot_dir);

        tracing::info!(
            "Running {} scenario(s) on {} against {}",
            suite.len(),
            probe.browser,
            probe.base_url
        );
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;
        Ok(rt.block_on(run_suite(&provider, &suite, &probe, &telemetry)))
    }
}

/// Standard flows plus credential cases, narrowed by `filter`
pub fn build_suite(filter: Option<&str>, credentials: &Path) -> CliResult<Suite> {
    let suite = Suite::standard().with_credentials(&CredentialsSource::from_path(credentials))?;
    Ok(match filter {
        Some(pattern) => suite.filtered(pattern),
        None => suite,
    })
}

/// Lines printed by `shopcheck list`
pub fn list_lines(args: &ListArgs) -> CliResult<Vec<String>> {
    let suite = build_suite(args.filter.as_deref(), &args.credentials)?;
    let mut lines = suite.names();
    lines.extend(
        suite
            .skipped()
            .iter()
            .map(|(name, reason)| format!("{name} (skipped: {reason})")),
    );
    Ok(lines)
}
