//! Logging and diagnostic screenshots.
//!
//! The log sink is the only process-wide state: [`init_logging`] installs a
//! console layer and a timestamped file layer once. Everything else goes
//! through an explicit [`Telemetry`] handle passed to page objects.
//! Telemetry is best-effort: no method here ever fails its caller.

use crate::driver::Driver;
use crate::result::{ProbeError, ProbeResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// File-name timestamp format shared by log files and screenshots
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Log sink configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory receiving `test_log_<stamp>.log`
    pub log_dir: PathBuf,
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Whether to echo messages to the console
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("reports").join("logs"),
            level: "info".to_string(),
            console: true,
        }
    }
}

impl LogConfig {
    /// Set the default level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the log directory
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Enable or disable console output
    #[must_use]
    pub const fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{} -", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Install the global subscriber.
///
/// Returns the log file path. Later calls return the path chosen by the
/// first call without reinstalling anything.
///
/// # Errors
///
/// Returns an I/O error if the log directory or file cannot be created.
pub fn init_logging(config: &LogConfig) -> ProbeResult<PathBuf> {
    if let Some(path) = LOG_FILE.get() {
        return Ok(path.clone());
    }

    fs::create_dir_all(&config.log_dir)?;
    let stamp = chrono::Local::now().format(FILE_STAMP_FORMAT);
    let path = config.log_dir.join(format!("test_log_{stamp}.log"));
    let file = File::create(&path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_timer(LocalTime)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    let console_layer = config.console.then(|| {
        fmt::layer()
            .without_time()
            .with_target(false)
            .with_level(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ProbeError::Config {
            message: format!("logging already initialised: {e}"),
        })?;

    let _ = LOG_FILE.set(path.clone());
    Ok(path)
}

/// Explicit diagnostics collaborator
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    screenshot_dir: Option<PathBuf>,
}

impl Telemetry {
    /// Telemetry writing screenshots into `dir`
    #[must_use]
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: Some(screenshot_dir.into()),
        }
    }

    /// Telemetry that logs but never touches the filesystem
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            screenshot_dir: None,
        }
    }

    /// Screenshot directory, if captures are enabled
    #[must_use]
    pub fn screenshot_dir(&self) -> Option<&Path> {
        self.screenshot_dir.as_deref()
    }

    /// Emit one log line at `level`
    pub fn log_line(&self, level: Level, message: &str) {
        if level == Level::ERROR {
            tracing::error!("{message}");
        } else if level == Level::WARN {
            tracing::warn!("{message}");
        } else if level == Level::INFO {
            tracing::info!("{message}");
        } else if level == Level::DEBUG {
            tracing::debug!("{message}");
        } else {
            tracing::trace!("{message}");
        }
    }

    /// Save a screenshot as `<dir>/<name>_<stamp>.png`.
    ///
    /// Returns `None` when captures are disabled or anything fails.
    pub async fn capture_screenshot<D>(&self, driver: &D, name: &str) -> Option<PathBuf>
    where
        D: Driver + ?Sized,
    {
        let dir = self.screenshot_dir.as_ref()?;
        let png = match driver.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!("Screenshot {name} failed: {e}");
                return None;
            }
        };
        let stamp = chrono::Local::now().format(FILE_STAMP_FORMAT);
        let path = dir.join(format!("{}_{stamp}.png", file_safe(name)));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await
        };
        match written.await {
            Ok(()) => {
                tracing::info!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Screenshot {name} could not be written: {e}");
                None
            }
        }
    }
}

fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "screenshot".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    mod name_tests {
        use super::*;

        #[test]
        fn test_file_safe_replaces_separators() {
            assert_eq!(file_safe("cart/remove item"), "cart_remove_item");
            assert_eq!(file_safe(""), "screenshot");
            assert_eq!(file_safe("wait-timeout_1"), "wait-timeout_1");
        }
    }

    mod capture_tests {
        use super::*;

        #[tokio::test]
        async fn test_capture_writes_png() {
            let dir = tempfile::tempdir().unwrap();
            let telemetry = Telemetry::new(dir.path().join("shots"));
            let driver = MockDriver::new();

            let path = telemetry
                .capture_screenshot(&driver, "login failed")
                .await
                .expect("screenshot path");

            assert!(path.exists());
            let file_name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(file_name.starts_with("login_failed_"));
            assert!(file_name.ends_with(".png"));
        }

        #[tokio::test]
        async fn test_disabled_never_calls_driver() {
            let driver = MockDriver::new();
            let path = Telemetry::disabled()
                .capture_screenshot(&driver, "anything")
                .await;
            assert!(path.is_none());
            assert_eq!(driver.screenshot_count(), 0);
        }

        #[tokio::test]
        async fn test_driver_failure_is_swallowed() {
            let dir = tempfile::tempdir().unwrap();
            let driver = MockDriver::new();
            driver.fail_screenshots(true);
            let path = Telemetry::new(dir.path())
                .capture_screenshot(&driver, "broken")
                .await;
            assert!(path.is_none());
        }
    }

    mod log_tests {
        use super::*;

        #[test]
        fn test_log_config_builder() {
            let config = LogConfig::default()
                .with_level("debug")
                .with_log_dir("/tmp/x")
                .with_console(false);
            assert_eq!(config.level, "debug");
            assert_eq!(config.log_dir, PathBuf::from("/tmp/x"));
            assert!(!config.console);
        }

        #[test]
        fn test_log_line_without_subscriber() {
            Telemetry::disabled().log_line(Level::WARN, "no subscriber installed");
        }
    }
}
