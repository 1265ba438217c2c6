//! Order confirmation page.

use crate::driver::Driver;
use crate::locator::Locator;
use crate::page_object::{not_loaded, PageContext, PageObject};
use crate::result::ProbeResult;
use crate::wait::Condition;
use async_trait::async_trait;

/// Confirmation container
pub const CONTAINER: Locator =
    Locator::xpath("//div[contains(@class,'checkout_complete_container')]");
/// "Thank you for your order!"
pub const HEADER: Locator = Locator::xpath("//h2[contains(@class,'complete-header')]");
/// Dispatch note below the header
pub const BODY: Locator = Locator::xpath("//div[contains(@class,'complete-text')]");
/// Back to the catalog
pub const BACK_HOME: Locator = Locator::xpath("//button[@id='back-to-products']");

const ALL: &[Locator] = &[CONTAINER, HEADER, BODY, BACK_HOME];

/// The page shown after placing an order
#[derive(Debug)]
pub struct CheckoutCompleteView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> CheckoutCompleteView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Confirmation header
    ///
    /// # Errors
    ///
    /// [`crate::ProbeError::PageNotLoaded`] if the page never shows.
    pub async fn header_text(&self) -> ProbeResult<String> {
        self.wait_loaded().await?;
        self.ctx.actions().read_text(&HEADER).await
    }

    /// Text below the header
    ///
    /// # Errors
    ///
    /// [`crate::ProbeError::PageNotLoaded`] if the page never shows.
    pub async fn body_text(&self) -> ProbeResult<String> {
        self.wait_loaded().await?;
        self.ctx.actions().read_text(&BODY).await
    }

    /// Whether a thank-you header is showing; never fails
    pub async fn is_thank_you_visible(&self) -> bool {
        match self.header_text().await {
            Ok(header) => header.to_lowercase().contains("thank you"),
            Err(e) => {
                tracing::warn!("No confirmation header: {e}");
                false
            }
        }
    }

    /// Return to the catalog
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn back_home(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&BACK_HOME).await?;
        Ok(())
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for CheckoutCompleteView<'_, D> {
    const NAME: &'static str = "checkout complete";

    fn locators() -> &'static [Locator] {
        ALL
    }

    fn ready_locator(&self) -> Locator {
        CONTAINER
    }

    fn url_fragment(&self) -> Option<&'static str> {
        Some("checkout-complete.html")
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }

    async fn wait_loaded(&self) -> ProbeResult<()> {
        let waiter = self.ctx.waiter();
        for locator in [CONTAINER, HEADER] {
            waiter
                .wait_for_element(&locator, Condition::Visible)
                .await
                .map_err(|e| not_loaded(Self::NAME, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockStorefront;
    use crate::telemetry::Telemetry;
    use crate::wait::WaitSpec;

    fn fast() -> WaitSpec {
        WaitSpec::new().with_timeout(300).with_poll_interval(5)
    }

    mod complete_tests {
        use super::*;

        #[tokio::test]
        async fn test_thank_you_and_back_home() {
            let store = MockStorefront::new().logged_in();
            store.open_path("/checkout-complete.html");
            let telemetry = Telemetry::disabled();
            let complete =
                CheckoutCompleteView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            assert!(complete.is_thank_you_visible().await);
            assert!(complete.body_text().await.unwrap().contains("dispatched"));

            complete.back_home().await.unwrap();
            assert!(store.driver().current_url().await.unwrap().ends_with("/inventory.html"));
        }

        #[tokio::test]
        async fn test_wrong_page_is_not_thank_you() {
            let store = MockStorefront::new().logged_in();
            let telemetry = Telemetry::disabled();
            let complete =
                CheckoutCompleteView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            assert!(!complete.is_thank_you_visible().await);
        }
    }
}
