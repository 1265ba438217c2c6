//! [`Driver`] over a W3C WebDriver session (fantoccini).

use crate::driver::Driver;
use crate::locator::{Locator, Strategy};
use crate::result::{DriverError, DriverErrorKind, DriverResult};
use async_trait::async_trait;
use fantoccini::elements::{Element, ElementRef};
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::Client;
use serde_json::Value;

/// W3C key under which scripts return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

impl From<CmdError> for DriverError {
    fn from(err: CmdError) -> Self {
        Self::new(classify(&err), err.to_string())
    }
}

/// Map a WebDriver failure onto the kinds the wait engine and actions react to
fn classify(err: &CmdError) -> DriverErrorKind {
    match err {
        CmdError::Standard(wd) => match wd.error {
            ErrorStatus::ElementNotInteractable => DriverErrorKind::NotInteractable,
            ErrorStatus::ElementClickIntercepted => DriverErrorKind::ClickIntercepted,
            ErrorStatus::StaleElementReference => DriverErrorKind::StaleElement,
            ErrorStatus::NoSuchElement => DriverErrorKind::NoSuchElement,
            ErrorStatus::JavascriptError => DriverErrorKind::Script,
            ErrorStatus::InvalidSessionId | ErrorStatus::SessionNotCreated => {
                DriverErrorKind::SessionLost
            }
            _ => DriverErrorKind::Other,
        },
        CmdError::Lost(_) => DriverErrorKind::SessionLost,
        _ => DriverErrorKind::Other,
    }
}

fn to_wire(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator.strategy() {
        Strategy::Id => fantoccini::Locator::Id(locator.value()),
        Strategy::Css => fantoccini::Locator::Css(locator.value()),
        Strategy::XPath => fantoccini::Locator::XPath(locator.value()),
    }
}

fn element_arg(element: &Element) -> DriverResult<Value> {
    serde_json::to_value(element).map_err(|e| {
        DriverError::new(
            DriverErrorKind::Script,
            format!("element cannot be passed to a script: {e}"),
        )
    })
}

/// A connected browser session
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Wrap a connected client
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Driver for WebDriverSession {
    type Element = Element;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        Ok(self.client.goto(url).await?)
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&self) -> DriverResult<String> {
        Ok(self.client.title().await?)
    }

    async fn back(&self) -> DriverResult<()> {
        Ok(self.client.back().await?)
    }

    async fn forward(&self) -> DriverResult<()> {
        Ok(self.client.forward().await?)
    }

    async fn refresh(&self) -> DriverResult<()> {
        Ok(self.client.refresh().await?)
    }

    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<Element>> {
        Ok(self.client.find_all(to_wire(locator)).await?)
    }

    async fn find_all_in(&self, parent: &Element, locator: &Locator) -> DriverResult<Vec<Element>> {
        Ok(parent.find_all(to_wire(locator)).await?)
    }

    async fn text(&self, element: &Element) -> DriverResult<String> {
        Ok(element.text().await?)
    }

    async fn attribute(&self, element: &Element, name: &str) -> DriverResult<Option<String>> {
        // `value` reflects what the user typed only as a property
        if name == "value" {
            return Ok(element.prop(name).await?);
        }
        Ok(element.attr(name).await?)
    }

    async fn is_displayed(&self, element: &Element) -> DriverResult<bool> {
        Ok(element.is_displayed().await?)
    }

    async fn is_enabled(&self, element: &Element) -> DriverResult<bool> {
        Ok(element.is_enabled().await?)
    }

    async fn click(&self, element: &Element) -> DriverResult<()> {
        Ok(element.click().await?)
    }

    async fn clear(&self, element: &Element) -> DriverResult<()> {
        Ok(element.clear().await?)
    }

    async fn send_keys(&self, element: &Element, text: &str) -> DriverResult<()> {
        Ok(element.send_keys(text).await?)
    }

    async fn select_by_value(&self, element: &Element, value: &str) -> DriverResult<()> {
        Ok(element.select_by_value(value).await?)
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> DriverResult<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    async fn execute_on(&self, script: &str, element: &Element, args: Vec<Value>) -> DriverResult<Value> {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(element_arg(element)?);
        all.extend(args);
        Ok(self.client.execute(script, all).await?)
    }

    async fn query_by_script(&self, locator: &Locator) -> DriverResult<Option<Element>> {
        let found = self
            .client
            .execute(&locator.to_query_script(), Vec::new())
            .await?;
        let id = found
            .as_object()
            .and_then(|map| map.get(ELEMENT_KEY))
            .and_then(Value::as_str);
        Ok(id.map(|id| Element::from_element_id(self.client.clone(), ElementRef::from(id.to_string()))))
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        Ok(self.client.screenshot().await?)
    }

    async fn quit(&self) -> DriverResult<()> {
        Ok(self.client.clone().close().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use fantoccini::error::WebDriver;

    fn standard(status: ErrorStatus) -> CmdError {
        CmdError::Standard(WebDriver::new(status, "from the browser"))
    }

    #[test]
    fn test_missing_element_is_classified() {
        assert_eq!(
            classify(&standard(ErrorStatus::NoSuchElement)),
            DriverErrorKind::NoSuchElement
        );
    }

    #[test]
    fn test_recoverable_statuses() {
        assert_eq!(
            classify(&standard(ErrorStatus::ElementClickIntercepted)),
            DriverErrorKind::ClickIntercepted
        );
        assert_eq!(
            classify(&standard(ErrorStatus::StaleElementReference)),
            DriverErrorKind::StaleElement
        );
        assert_eq!(
            classify(&standard(ErrorStatus::ElementNotInteractable)),
            DriverErrorKind::NotInteractable
        );
    }

    #[test]
    fn test_session_failures() {
        assert_eq!(
            classify(&standard(ErrorStatus::InvalidSessionId)),
            DriverErrorKind::SessionLost
        );
        let lost = CmdError::Lost(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(classify(&lost), DriverErrorKind::SessionLost);
        assert_eq!(classify(&CmdError::WaitTimeout), DriverErrorKind::Other);
    }

    #[test]
    fn test_conversion_keeps_message() {
        let err = DriverError::from(standard(ErrorStatus::JavascriptError));
        assert_eq!(err.kind, DriverErrorKind::Script);
        assert!(err.message.contains("from the browser"));
    }

    #[test]
    fn test_wire_locators() {
        assert!(matches!(to_wire(&Locator::id("login-button")), fantoccini::Locator::Id("login-button")));
        assert!(matches!(to_wire(&Locator::css(".cart_list")), fantoccini::Locator::Css(".cart_list")));
        assert!(matches!(to_wire(&Locator::xpath("//div")), fantoccini::Locator::XPath("//div")));
    }
}
