//! Shopcheck: end-to-end UI regression suite for the Sauce Demo store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      SHOPCHECK Architecture                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Scenario ──► PageObject ──► ResilientAction ──► WaitEngine      │
//! │                  views           fallbacks         polling       │
//! │                                                       │          │
//! │                                                       ▼          │
//! │                      Driver (WebDriver session | MockDriver)     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing below the page objects knows about assertions, and nothing above
//! the wait engine knows how waiting is done.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_frames))]

mod action;
mod driver;
mod locator;
mod page_object;
mod result;
mod wait;

/// Run configuration from the environment
pub mod config;

/// Data-driven login cases
pub mod credentials;

/// In-memory driver and storefront
pub mod mock;

/// Page objects for every store page
pub mod pages;

/// End-to-end scenarios and the suite runner
#[allow(clippy::missing_errors_doc)]
pub mod scenario;

/// Browser session lifecycle
pub mod session;

/// Logging and screenshots
pub mod telemetry;

/// W3C WebDriver implementation of [`Driver`]
pub mod webdriver;

pub use action::{
    Action, ActionPolicy, AttemptStrategy, InteractionOutcome, ResilientAction,
};
pub use config::ProbeConfig;
pub use credentials::{CredentialCase, CredentialsSource, ExpectedOutcome};
pub use driver::{scripts, Driver};
pub use locator::{Locator, Strategy};
pub use page_object::{
    not_loaded, parse_amount, parse_count, parse_price, Absent, PageContext, PageObject, Presence,
};
pub use result::{DriverError, DriverErrorKind, DriverResult, ProbeError, ProbeResult};
pub use scenario::{run_suite, Flow, Scenario, ScenarioEnv, Suite, SuiteReport, Verdict};
pub use session::{
    with_session, BrowserKind, BrowserSession, DriverBinaryLocator, SessionConfig, SessionHandle,
    SessionProvider, SessionSource,
};
pub use telemetry::{init_logging, LogConfig, Telemetry};
pub use wait::{
    Condition, Poll, WaitEngine, WaitSpec, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
    SCRIPT_LOOKUP_TIMEOUT_MS, SHORT_WAIT_TIMEOUT_MS,
};
pub use webdriver::WebDriverSession;
