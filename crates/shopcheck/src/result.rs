//! Result and error types for Shopcheck.
//!
//! Expected absences (an item that is not in the cart, a badge that is not
//! rendered) are never errors; page objects report them as `false`, `0` or an
//! empty value. Everything in [`ProbeError`] is a genuine fault.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Shopcheck operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result type for raw driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors that can occur in Shopcheck
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A wait for an element never succeeded
    #[error("Element not found: {locator} was not {condition} within {timeout_ms}ms")]
    ElementNotFound {
        /// Locator that was waited for
        locator: String,
        /// Condition that was expected
        condition: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// A wait on an arbitrary condition never succeeded
    #[error("Condition not met within {timeout_ms}ms: {description}")]
    ConditionNotMet {
        /// Condition description
        description: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Browser driver binary could not be located
    #[error("{} driver not found. Searched locations:\n{}", .browser, format_searched(.searched))]
    DriverNotFound {
        /// Browser the driver was needed for
        browser: String,
        /// Every location that was checked, in search order
        searched: Vec<PathBuf>,
    },

    /// Native and script interaction both failed
    #[error("{action} on {locator} failed after every fallback: {cause}")]
    InteractionFallbackExhausted {
        /// Action name (click, set_value, select_option)
        action: String,
        /// Locator of the target element
        locator: String,
        /// Failure of the last attempt
        cause: String,
    },

    /// A page's defining element never became visible
    #[error("Page not loaded: {page}: {source}")]
    PageNotLoaded {
        /// Page name
        page: String,
        /// Underlying wait failure
        #[source]
        source: Box<ProbeError>,
    },

    /// Element was shown but its content could not be interpreted
    #[error("Unexpected content in {locator}: {text:?}")]
    UnparsableContent {
        /// Locator of the element
        locator: String,
        /// Text that failed to parse
        text: String,
    },

    /// Locator failed construction-time validation
    #[error("Invalid locator {strategy}={value:?}: {message}")]
    InvalidLocator {
        /// Strategy name
        strategy: String,
        /// Rejected selector value
        value: String,
        /// Validation message
        message: String,
    },

    /// Browser session could not be created or was lost
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Driver call failed with a fault that is not recoverable at this level
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Scenario assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Credentials file could not be parsed
    #[error("Credentials error: {message}")]
    Credentials {
        /// Error message
        message: String,
    },

    /// Configuration value could not be parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Whether this error came from the infrastructure (driver/session) rather than the UI
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        match self {
            Self::DriverNotFound { .. } | Self::Session { .. } => true,
            Self::Driver(e) => matches!(e.kind, DriverErrorKind::SessionLost),
            _ => false,
        }
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classification of a failed driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverErrorKind {
    /// Element exists but cannot be interacted with (hidden, off-screen, disabled)
    NotInteractable,
    /// Another element would receive the click
    ClickIntercepted,
    /// Element handle no longer attached to the document
    StaleElement,
    /// No element matched
    NoSuchElement,
    /// Script execution failed
    Script,
    /// Session or connection is gone
    SessionLost,
    /// Anything else
    Other,
}

impl DriverErrorKind {
    /// Get the kind name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotInteractable => "element not interactable",
            Self::ClickIntercepted => "element click intercepted",
            Self::StaleElement => "stale element reference",
            Self::NoSuchElement => "no such element",
            Self::Script => "javascript error",
            Self::SessionLost => "session lost",
            Self::Other => "driver error",
        }
    }

    /// Whether a poll should treat this failure as "not yet"
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StaleElement | Self::NoSuchElement)
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed driver call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DriverError {
    /// Failure classification
    pub kind: DriverErrorKind,
    /// Driver-reported message
    pub message: String,
}

impl DriverError {
    /// Create a new driver error
    #[must_use]
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_not_found_lists_every_location() {
        let err = ProbeError::DriverNotFound {
            browser: "edge".into(),
            searched: vec![
                PathBuf::from("/opt/drivers/msedgedriver"),
                PathBuf::from("/home/qa/WebDrivers/msedgedriver"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("edge driver not found"));
        assert!(text.contains("/opt/drivers/msedgedriver"));
        assert!(text.contains("/home/qa/WebDrivers/msedgedriver"));
    }

    #[test]
    fn test_page_not_loaded_keeps_source() {
        let inner = ProbeError::ElementNotFound {
            locator: "id=cart_list".into(),
            condition: "visible".into(),
            timeout_ms: 100,
        };
        let err = ProbeError::PageNotLoaded {
            page: "cart".into(),
            source: Box::new(inner),
        };
        assert!(err.to_string().contains("cart"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_infrastructure_classification() {
        assert!(ProbeError::session("gone").is_infrastructure());
        assert!(ProbeError::Driver(DriverError::new(DriverErrorKind::SessionLost, "x"))
            .is_infrastructure());
        assert!(!ProbeError::Driver(DriverError::new(DriverErrorKind::Script, "x"))
            .is_infrastructure());
        assert!(!ProbeError::assertion("nope").is_infrastructure());
    }

    #[test]
    fn test_transient_kinds() {
        assert!(DriverErrorKind::StaleElement.is_transient());
        assert!(DriverErrorKind::NoSuchElement.is_transient());
        assert!(!DriverErrorKind::ClickIntercepted.is_transient());
        assert!(!DriverErrorKind::SessionLost.is_transient());
    }
}
