//! Element locators.
//!
//! A [`Locator`] is a strategy plus selector pair. Page objects declare their
//! locators once as constants; dynamic locators built at runtime go through
//! [`Locator::new`], which validates the pair.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// STRATEGY
// =============================================================================

/// Lookup strategy understood by the browser automation client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Element id attribute
    Id,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
}

impl Strategy {
    /// W3C WebDriver name of the strategy
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css selector",
            Self::XPath => "xpath",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "css" | "css selector" | "css_selector" => Ok(Self::Css),
            "xpath" => Ok(Self::XPath),
            other => Err(ProbeError::InvalidLocator {
                strategy: other.to_string(),
                value: String::new(),
                message: "unknown strategy".to_string(),
            }),
        }
    }
}

// =============================================================================
// LOCATOR
// =============================================================================

/// Strategy plus selector identifying zero or more elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    value: Cow<'static, str>,
}

impl Locator {
    /// Create a validated locator
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidLocator`] if the value is blank, an id
    /// contains whitespace, or an XPath does not start with `/`, `.` or `(`.
    pub fn new(strategy: Strategy, value: impl Into<String>) -> ProbeResult<Self> {
        let value = value.into();
        validate(strategy, &value)?;
        Ok(Self {
            strategy,
            value: Cow::Owned(value),
        })
    }

    /// Id locator for a static table entry
    #[must_use]
    pub const fn id(value: &'static str) -> Self {
        Self {
            strategy: Strategy::Id,
            value: Cow::Borrowed(value),
        }
    }

    /// CSS locator for a static table entry
    #[must_use]
    pub const fn css(value: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            value: Cow::Borrowed(value),
        }
    }

    /// XPath locator for a static table entry
    #[must_use]
    pub const fn xpath(value: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            value: Cow::Borrowed(value),
        }
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the selector value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Re-run construction-time validation (used for static tables)
    ///
    /// # Errors
    ///
    /// Same conditions as [`Locator::new`].
    pub fn validate(&self) -> ProbeResult<()> {
        validate(self.strategy, &self.value)
    }

    /// Whether this XPath is relative to a parent element
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.strategy == Strategy::XPath && self.value.starts_with('.')
    }

    /// JavaScript expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query_script(&self) -> String {
        let literal = js_string(&self.value);
        match self.strategy {
            Strategy::Id => format!("document.getElementById({literal})"),
            Strategy::Css => format!("document.querySelector({literal})"),
            Strategy::XPath => format!(
                "document.evaluate({literal}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.strategy {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
        };
        write!(f, "{name}={}", self.value)
    }
}

fn validate(strategy: Strategy, value: &str) -> ProbeResult<()> {
    let invalid = |message: &str| ProbeError::InvalidLocator {
        strategy: strategy.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid("selector is empty"));
    }
    match strategy {
        Strategy::Id if trimmed.chars().any(char::is_whitespace) => {
            Err(invalid("id must not contain whitespace"))
        }
        Strategy::XPath if !trimmed.starts_with(['/', '.', '(']) => {
            Err(invalid("xpath must start with '/', '.' or '('"))
        }
        _ => Ok(()),
    }
}

/// Quote a string as a JavaScript literal
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
