//! Browser session lifecycle.
//!
//! [`SessionProvider::open`] locates the driver binary, gives the browser a
//! throwaway profile directory, starts the driver on a free port and connects
//! a WebDriver session. [`SessionHandle`] owns all three and releases them on
//! [`BrowserSession::close`], or on drop as a fallback. [`with_session`] is
//! the scoped form used by the suite runner.

use crate::driver::Driver;
use crate::result::{ProbeError, ProbeResult};
use crate::webdriver::WebDriverSession;
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::process::{Child, Command};
use uuid::Uuid;

/// Default window size passed to the browser
pub const DEFAULT_WINDOW: (u32, u32) = (1440, 900);

/// How long a freshly spawned driver gets to accept connections
pub const DRIVER_STARTUP_TIMEOUT_MS: u64 = 15_000;

// =============================================================================
// BROWSER KIND
// =============================================================================

/// Supported browsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome / Chromium via chromedriver
    Chrome,
    /// Microsoft Edge via msedgedriver
    Edge,
}

impl BrowserKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
        }
    }

    /// Driver executable name for this platform
    #[must_use]
    pub fn driver_binary(self) -> String {
        let stem = match self {
            Self::Chrome => "chromedriver",
            Self::Edge => "msedgedriver",
        };
        format!("{stem}{}", std::env::consts::EXE_SUFFIX)
    }

    /// W3C `browserName` capability
    #[must_use]
    pub const fn browser_name(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "MicrosoftEdge",
        }
    }

    /// Vendor options capability key
    #[must_use]
    pub const fn options_key(self) -> &'static str {
        match self {
            Self::Chrome => "goog:chromeOptions",
            Self::Edge => "ms:edgeOptions",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "edge" | "msedge" | "microsoftedge" => Ok(Self::Edge),
            other => Err(ProbeError::Config {
                message: format!("unsupported browser {other:?} (expected chrome or edge)"),
            }),
        }
    }
}

// =============================================================================
// DRIVER DISCOVERY
// =============================================================================

/// Finds the driver executable for a browser
#[derive(Debug, Clone)]
pub struct DriverBinaryLocator {
    project_root: PathBuf,
    home: Option<PathBuf>,
    search_path: bool,
}

impl DriverBinaryLocator {
    /// Search `PATH`, then the fixed locations relative to `project_root`
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            home: dirs::home_dir(),
            search_path: true,
        }
    }

    /// Skip the `PATH` lookup
    #[must_use]
    pub const fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    /// Override the home directory used for `~/WebDrivers`
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Fixed fallback locations, in search order
    #[must_use]
    pub fn fallbacks(&self, browser: BrowserKind) -> Vec<PathBuf> {
        let bin = browser.driver_binary();
        let drivers = self.project_root.join("drivers");
        let mut paths = vec![
            drivers.join("edgedriver_win64").join(&bin),
            drivers.join(&bin),
            PathBuf::from("C:/WebDrivers").join(&bin),
        ];
        if let Some(home) = &self.home {
            paths.push(home.join("WebDrivers").join(&bin));
        }
        paths.push(PathBuf::from(".").join(&bin));
        paths
    }

    /// Resolve the driver executable
    ///
    /// # Errors
    ///
    /// [`ProbeError::DriverNotFound`] listing every location that was checked.
    pub fn locate(&self, browser: BrowserKind) -> ProbeResult<PathBuf> {
        let bin = browser.driver_binary();
        let mut searched = Vec::new();
        if self.search_path {
            match which::which(&bin) {
                Ok(found) => {
                    tracing::debug!("Found {bin} on PATH: {}", found.display());
                    return Ok(found);
                }
                Err(_) => searched.push(PathBuf::from(format!("$PATH/{bin}"))),
            }
        }
        for candidate in self.fallbacks(browser) {
            if candidate.is_file() {
                tracing::debug!("Found {bin} at {}", candidate.display());
                return Ok(candidate);
            }
            searched.push(candidate);
        }
        Err(ProbeError::DriverNotFound {
            browser: browser.to_string(),
            searched,
        })
    }
}

// =============================================================================
// SESSION CONFIG
// =============================================================================

/// Settings for one browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Browser to launch
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Window size in pixels
    pub window: (u32, u32),
    /// How long the driver gets to start listening
    pub startup_timeout: Duration,
}

impl SessionConfig {
    /// Defaults for `browser`
    #[must_use]
    pub const fn new(browser: BrowserKind) -> Self {
        Self {
            browser,
            headless: false,
            window: DEFAULT_WINDOW,
            startup_timeout: Duration::from_millis(DRIVER_STARTUP_TIMEOUT_MS),
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the window size
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window = (width, height);
        self
    }

    /// WebDriver capabilities for a session using `profile`
    #[must_use]
    pub fn capabilities(&self, profile: &Path) -> Map<String, Value> {
        let (width, height) = self.window;
        let mut args = vec![
            format!("--user-data-dir={}", profile.display()),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            format!("--window-size={width},{height}"),
            "--disable-blink-features=AutomationControlled".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }

        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!(self.browser.browser_name()));
        caps.insert(
            self.browser.options_key().to_string(),
            json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
                "useAutomationExtension": false,
            }),
        );
        caps
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

/// An open browser session
#[async_trait]
pub trait BrowserSession: Send + Sync + Sized {
    /// Driver the session exposes; clones share the session
    type Driver: Driver + Clone;

    /// Driver for page objects
    fn driver(&self) -> &Self::Driver;

    /// Release every resource; failures are logged, never raised
    async fn close(self);
}

/// Something that opens sessions
#[async_trait]
pub trait SessionSource: Sync {
    /// Session type produced
    type Session: BrowserSession;

    /// Open a fresh, isolated session
    async fn open(&self, config: &SessionConfig) -> ProbeResult<Self::Session>;
}

/// Opens real browser sessions
#[derive(Debug, Clone)]
pub struct SessionProvider {
    binaries: DriverBinaryLocator,
}

impl SessionProvider {
    /// Create a provider that finds drivers with `binaries`
    #[must_use]
    pub const fn new(binaries: DriverBinaryLocator) -> Self {
        Self { binaries }
    }
}

#[async_trait]
impl SessionSource for SessionProvider {
    type Session = SessionHandle;

    async fn open(&self, config: &SessionConfig) -> ProbeResult<SessionHandle> {
        let browser = config.browser;
        let binary = self.binaries.locate(browser)?;

        let profile = tempfile::Builder::new()
            .prefix(&format!("{browser}_{}_", Uuid::new_v4().simple()))
            .tempdir()?;
        tracing::info!("Profile directory for {browser}: {}", profile.path().display());

        let port = free_port().await?;
        let mut process = Command::new(&binary)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProbeError::session(format!("cannot start {}: {e}", binary.display())))?;

        if let Err(e) = wait_for_port(port, config.startup_timeout).await {
            let _ = process.start_kill();
            return Err(e);
        }

        let endpoint = format!("http://127.0.0.1:{port}");
        let client = match ClientBuilder::native()
            .capabilities(config.capabilities(profile.path()))
            .connect(&endpoint)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                let _ = process.start_kill();
                return Err(ProbeError::session(format!(
                    "cannot create {browser} session at {endpoint}: {e}"
                )));
            }
        };
        tracing::info!("{browser} session started (driver on port {port})");

        Ok(SessionHandle {
            browser,
            session: WebDriverSession::new(client),
            process: Some(process),
            profile: Some(profile),
            closed: false,
        })
    }
}

async fn free_port() -> ProbeResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

async fn wait_for_port(port: u16, limit: Duration) -> ProbeResult<()> {
    let poll = async {
        loop {
            if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };
    tokio::time::timeout(limit, poll).await.map_err(|_| {
        ProbeError::session(format!(
            "driver did not listen on port {port} within {}ms",
            limit.as_millis()
        ))
    })
}

/// A live browser session with its driver process and profile directory
pub struct SessionHandle {
    browser: BrowserKind,
    session: WebDriverSession,
    process: Option<Child>,
    profile: Option<TempDir>,
    closed: bool,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("browser", &self.browser)
            .field("profile", &self.profile_dir())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    /// Browser of this session
    #[must_use]
    pub const fn browser(&self) -> BrowserKind {
        self.browser
    }

    /// Profile directory, until the session is closed
    #[must_use]
    pub fn profile_dir(&self) -> Option<&Path> {
        self.profile.as_ref().map(TempDir::path)
    }
}

#[async_trait]
impl BrowserSession for SessionHandle {
    type Driver = WebDriverSession;

    fn driver(&self) -> &WebDriverSession {
        &self.session
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.session.quit().await {
            tracing::warn!("Quitting {} session failed: {e}", self.browser);
        }
        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.kill().await {
                tracing::debug!("Driver process already gone: {e}");
            }
        }
        if let Some(profile) = self.profile.take() {
            let path = profile.path().to_path_buf();
            match profile.close() {
                Ok(()) => tracing::info!("Removed profile directory {}", path.display()),
                Err(e) => tracing::warn!("Could not remove profile {}: {e}", path.display()),
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!("{} session dropped without close; killing driver", self.browser);
        if let Some(process) = self.process.as_mut() {
            let _ = process.start_kill();
        }
    }
}

/// Open a session, run `body`, and close the session on every path.
///
/// `body` receives a handle to the session's driver. A panic inside `body`
/// is resumed after the session is closed.
///
/// # Errors
///
/// Session start-up failures, or whatever `body` returns.
pub async fn with_session<S, T, F, Fut>(source: &S, config: &SessionConfig, body: F) -> ProbeResult<T>
where
    S: SessionSource,
    F: FnOnce(<S::Session as BrowserSession>::Driver) -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
{
    let session = source.open(config).await?;
    let outcome = AssertUnwindSafe(body(session.driver().clone()))
        .catch_unwind()
        .await;
    session.close().await;
    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, StorefrontSessions};

    mod browser_tests {
        use super::*;

        #[test]
        fn test_parse_browser() {
            assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
            assert_eq!(" EDGE ".parse::<BrowserKind>().unwrap(), BrowserKind::Edge);
            assert!(matches!(
                "firefox".parse::<BrowserKind>(),
                Err(ProbeError::Config { .. })
            ));
        }

        #[test]
        fn test_driver_binary_names() {
            assert!(BrowserKind::Chrome.driver_binary().starts_with("chromedriver"));
            assert!(BrowserKind::Edge.driver_binary().starts_with("msedgedriver"));
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_fallback_order() {
            let binaries = DriverBinaryLocator::new("/project")
                .without_path_search()
                .with_home(Some(PathBuf::from("/home/tester")));
            let bin = BrowserKind::Edge.driver_binary();
            let paths = binaries.fallbacks(BrowserKind::Edge);

            assert_eq!(paths[0], PathBuf::from("/project/drivers/edgedriver_win64").join(&bin));
            assert_eq!(paths[1], PathBuf::from("/project/drivers").join(&bin));
            assert_eq!(paths[2], PathBuf::from("C:/WebDrivers").join(&bin));
            assert_eq!(paths[3], PathBuf::from("/home/tester/WebDrivers").join(&bin));
            assert_eq!(paths[4], PathBuf::from(".").join(&bin));
        }

        #[test]
        fn test_found_in_project_drivers() {
            let root = tempfile::tempdir().unwrap();
            let bin = BrowserKind::Chrome.driver_binary();
            std::fs::create_dir_all(root.path().join("drivers")).unwrap();
            std::fs::write(root.path().join("drivers").join(&bin), b"").unwrap();

            let found = DriverBinaryLocator::new(root.path())
                .without_path_search()
                .with_home(None)
                .locate(BrowserKind::Chrome)
                .unwrap();
            assert_eq!(found, root.path().join("drivers").join(&bin));
        }

        #[test]
        fn test_not_found_lists_every_location() {
            let root = tempfile::tempdir().unwrap();
            let err = DriverBinaryLocator::new(root.path().join("nowhere"))
                .without_path_search()
                .with_home(None)
                .locate(BrowserKind::Edge)
                .unwrap_err();

            let ProbeError::DriverNotFound { browser, searched } = &err else {
                panic!("expected DriverNotFound, got {err}");
            };
            assert_eq!(browser, "edge");
            assert_eq!(searched.len(), 4);
            let message = err.to_string();
            for path in searched {
                assert!(message.contains(&path.display().to_string()));
            }
        }
    }

    mod capability_tests {
        use super::*;

        fn args(caps: &Map<String, Value>, key: &str) -> Vec<String> {
            caps[key]["args"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect()
        }

        #[test]
        fn test_headless_edge_capabilities() {
            let config = SessionConfig::new(BrowserKind::Edge).with_headless(true);
            let caps = config.capabilities(Path::new("/tmp/profile"));

            assert_eq!(caps["browserName"], "MicrosoftEdge");
            let args = args(&caps, "ms:edgeOptions");
            assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
            assert!(args.contains(&"--window-size=1440,900".to_string()));
            assert!(args.contains(&"--headless=new".to_string()));
            assert_eq!(caps["ms:edgeOptions"]["excludeSwitches"][0], "enable-automation");
            assert_eq!(caps["ms:edgeOptions"]["useAutomationExtension"], false);
        }

        #[test]
        fn test_headed_chrome_has_no_headless_flag() {
            let caps = SessionConfig::new(BrowserKind::Chrome).capabilities(Path::new("/p"));
            assert!(!args(&caps, "goog:chromeOptions").iter().any(|a| a.starts_with("--headless")));
        }
    }

    mod scope_tests {
        use super::*;

        #[tokio::test]
        async fn test_closed_after_success_and_error() {
            let sessions = StorefrontSessions::new();
            let config = SessionConfig::new(BrowserKind::Chrome);

            let ok = with_session(&sessions, &config, |driver: MockDriver| async move {
                driver.goto("https://www.saucedemo.com/").await?;
                Ok::<u32, ProbeError>(7)
            })
            .await;
            assert_eq!(ok.unwrap(), 7);

            let failed: ProbeResult<()> = with_session(&sessions, &config, |_driver: MockDriver| async {
                Err(ProbeError::assertion("boom"))
            })
            .await;
            assert!(failed.is_err());
            assert_eq!(sessions.opened(), 2);
            assert_eq!(sessions.closed(), 2);
        }

        #[tokio::test]
        async fn test_closed_when_body_panics() {
            let sessions = StorefrontSessions::new();
            let config = SessionConfig::new(BrowserKind::Chrome);

            let run = AssertUnwindSafe(with_session(&sessions, &config, |_driver: MockDriver| async {
                let fail = true;
                if fail {
                    panic!("scenario blew up");
                }
                Ok::<(), ProbeError>(())
            }))
            .catch_unwind()
            .await;

            assert!(run.is_err());
            assert_eq!(sessions.closed(), 1);
        }
    }
}
