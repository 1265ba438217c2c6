//! Browser automation seam.
//!
//! Everything above this module talks to the browser through [`Driver`].
//! [`crate::webdriver::WebDriverSession`] implements it over a W3C WebDriver
//! connection and [`crate::mock::MockDriver`] implements it in memory.

use crate::locator::Locator;
use crate::result::DriverResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// Scripts shared by every driver implementation.
///
/// Element arguments are always passed as `arguments[0]`.
pub mod scripts {
    /// Programmatic click that bypasses interactability checks
    pub const CLICK: &str = "arguments[0].click();";

    /// Scroll the element to the centre of the viewport
    pub const SCROLL_INTO_VIEW: &str =
        "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";

    /// Set a control's value and dispatch `change`
    pub const SET_VALUE_AND_CHANGE: &str = "arguments[0].value = arguments[1]; \
         arguments[0].dispatchEvent(new Event('change', {bubbles: true}));";

    /// Set an input's value and dispatch `input` then `change`
    pub const SET_VALUE_AND_INPUT: &str = "arguments[0].value = arguments[1]; \
         arguments[0].dispatchEvent(new Event('input', {bubbles: true})); \
         arguments[0].dispatchEvent(new Event('change', {bubbles: true}));";

    /// Scroll the window to the bottom of the document
    pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

    /// Scroll the window back to the top
    pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";

    /// Whether an image element finished loading with real pixels
    pub const IMAGE_LOADED: &str =
        "return arguments[0].complete && arguments[0].naturalWidth > 0;";

    /// Raw text content, including text hidden from `innerText`
    pub const TEXT_CONTENT: &str = "return arguments[0].textContent;";
}

/// Browser automation operations used by the wait engine and page objects
#[async_trait]
pub trait Driver: Send + Sync {
    /// Handle to an element in the current document
    type Element: Clone + Debug + Send + Sync;

    /// Navigate to a URL
    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// Current document URL
    async fn current_url(&self) -> DriverResult<String>;

    /// Current document title
    async fn title(&self) -> DriverResult<String>;

    /// History back
    async fn back(&self) -> DriverResult<()>;

    /// History forward
    async fn forward(&self) -> DriverResult<()>;

    /// Reload the current document
    async fn refresh(&self) -> DriverResult<()>;

    /// All elements matching a locator, in document order
    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<Self::Element>>;

    /// All descendants of `parent` matching a locator
    async fn find_all_in(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> DriverResult<Vec<Self::Element>>;

    /// Rendered text of an element
    async fn text(&self, element: &Self::Element) -> DriverResult<String>;

    /// Attribute or property value
    async fn attribute(&self, element: &Self::Element, name: &str)
        -> DriverResult<Option<String>>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, element: &Self::Element) -> DriverResult<bool>;

    /// Whether the element accepts interaction
    async fn is_enabled(&self, element: &Self::Element) -> DriverResult<bool>;

    /// Native click
    async fn click(&self, element: &Self::Element) -> DriverResult<()>;

    /// Clear an input
    async fn clear(&self, element: &Self::Element) -> DriverResult<()>;

    /// Type into an input
    async fn send_keys(&self, element: &Self::Element, text: &str) -> DriverResult<()>;

    /// Native `<select>` option choice by value
    async fn select_by_value(&self, element: &Self::Element, value: &str) -> DriverResult<()>;

    /// Run a script in the page
    async fn execute(&self, script: &str, args: Vec<Value>) -> DriverResult<Value>;

    /// Run a script with `element` as `arguments[0]` followed by `args`
    async fn execute_on(
        &self,
        script: &str,
        element: &Self::Element,
        args: Vec<Value>,
    ) -> DriverResult<Value>;

    /// Resolve the first match of a locator through a page script
    async fn query_by_script(&self, locator: &Locator) -> DriverResult<Option<Self::Element>>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> DriverResult<Vec<u8>>;

    /// End the browser session
    async fn quit(&self) -> DriverResult<()>;
}
