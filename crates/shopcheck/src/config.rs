//! Run configuration from the environment.

use crate::result::{ProbeError, ProbeResult};
use crate::session::{BrowserKind, SessionConfig};
use crate::wait::WaitSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Store the suite runs against unless `BASE_URL` says otherwise
pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com";

/// Default location of the credential cases
pub const DEFAULT_CREDENTIALS_PATH: &str = "data/credentials.csv";

/// Default screenshot directory
pub const DEFAULT_SCREENSHOT_DIR: &str = "screenshots";

/// Environment variable names
pub mod env {
    /// Target store URL
    pub const BASE_URL: &str = "BASE_URL";
    /// Truthy to run without a window
    pub const HEADLESS: &str = "HEADLESS";
    /// `chrome` or `edge`
    pub const DEFAULT_BROWSER: &str = "DEFAULT_BROWSER";
}

/// Settings for one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Store URL without a trailing slash
    pub base_url: String,
    /// Run without a visible window
    pub headless: bool,
    /// Browser to drive
    pub browser: BrowserKind,
    /// Default wait for page objects
    #[serde(skip)]
    pub wait: WaitSpec,
    /// Credential cases file
    pub credentials_path: PathBuf,
    /// Where screenshots go
    pub screenshot_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: false,
            browser: BrowserKind::Edge,
            wait: WaitSpec::default(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
        }
    }
}

impl ProbeConfig {
    /// Read `BASE_URL`, `HEADLESS` and `DEFAULT_BROWSER` from the process
    ///
    /// # Errors
    ///
    /// [`ProbeError::Config`] for an unknown browser or a malformed URL.
    pub fn from_env() -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    ///
    /// # Errors
    ///
    /// [`ProbeError::Config`] for an unknown browser or a malformed URL.
    pub fn from_lookup<F>(lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(env::BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(&url)?;
        }
        if let Some(flag) = lookup(env::HEADLESS) {
            config.headless = is_truthy(&flag);
        }
        if let Some(browser) = lookup(env::DEFAULT_BROWSER).filter(|v| !v.trim().is_empty()) {
            config.browser = browser.parse()?;
        }
        Ok(config)
    }

    /// Replace the store URL
    ///
    /// # Errors
    ///
    /// [`ProbeError::Config`] when `url` is not an absolute http(s) URL.
    pub fn with_base_url(mut self, url: &str) -> ProbeResult<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let parsed = url::Url::parse(trimmed).map_err(|e| ProbeError::Config {
            message: format!("invalid base URL {url:?}: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProbeError::Config {
                message: format!("base URL must be http or https, got {url:?}"),
            });
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the browser
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Set the page object wait
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitSpec) -> Self {
        self.wait = wait;
        self
    }

    /// Set the credential cases file
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Session settings derived from this run
    #[must_use]
    pub const fn session(&self) -> SessionConfig {
        SessionConfig::new(self.browser).with_headless(self.headless)
    }
}

/// `1`, `true`, `yes` and `on`, in any case
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_defaults_when_unset() {
            let config = ProbeConfig::from_lookup(lookup(&[])).unwrap();
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert!(!config.headless);
            assert_eq!(config.browser, BrowserKind::Edge);
        }

        #[test]
        fn test_overrides() {
            let config = ProbeConfig::from_lookup(lookup(&[
                (env::BASE_URL, "http://localhost:8080/"),
                (env::HEADLESS, "Yes"),
                (env::DEFAULT_BROWSER, "chrome"),
            ]))
            .unwrap();
            assert_eq!(config.base_url, "http://localhost:8080");
            assert!(config.headless);
            assert_eq!(config.browser, BrowserKind::Chrome);
        }

        #[test]
        fn test_bad_browser_is_config_error() {
            let err = ProbeConfig::from_lookup(lookup(&[(env::DEFAULT_BROWSER, "safari")])).unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }

        #[test]
        fn test_relative_url_rejected() {
            assert!(ProbeConfig::default().with_base_url("saucedemo").is_err());
            assert!(ProbeConfig::default().with_base_url("ftp://example.com").is_err());
        }
    }

    mod truthy_tests {
        use super::*;

        #[test]
        fn test_truthy_values() {
            for value in ["1", "true", "TRUE", " yes ", "On"] {
                assert!(is_truthy(value), "{value}");
            }
            for value in ["0", "false", "", "no", "enabled"] {
                assert!(!is_truthy(value), "{value}");
            }
        }

        #[test]
        fn test_session_follows_config() {
            let session = ProbeConfig::default()
                .with_browser(BrowserKind::Chrome)
                .with_headless(true)
                .session();
            assert_eq!(session.browser, BrowserKind::Chrome);
            assert!(session.headless);
        }
    }
}
