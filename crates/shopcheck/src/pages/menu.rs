//! Side menu (burger menu) and header controls present on every logged-in page.

use crate::driver::Driver;
use crate::locator::Locator;
use crate::page_object::{any_displayed, PageContext, PageObject};
use crate::result::{DriverResult, ProbeResult};
use crate::wait::{Condition, Poll};
use async_trait::async_trait;

/// Opens the menu
pub const BURGER_BUTTON: Locator = Locator::xpath("//button[@id='react-burger-menu-btn']");
/// Closes the menu
pub const CLOSE_BUTTON: Locator = Locator::xpath("//button[@id='react-burger-cross-btn']");
/// Menu panel
pub const MENU_PANEL: Locator =
    Locator::xpath("//nav[contains(@class,'bm-item-list') or contains(@class,'bm-menu')]");
/// "All Items" link
pub const ALL_ITEMS: Locator = Locator::xpath("//a[@id='inventory_sidebar_link']");
/// "About" link
pub const ABOUT: Locator = Locator::xpath("//a[@id='about_sidebar_link']");
/// "Logout" link
pub const LOGOUT: Locator = Locator::xpath("//a[@id='logout_sidebar_link']");
/// "Reset App State" link
pub const RESET_APP_STATE: Locator = Locator::xpath("//a[@id='reset_sidebar_link']");
/// Cart link in the header
pub const CART_LINK: Locator = Locator::xpath("//a[contains(@class,'shopping_cart_link')]");
/// Cart badge in the header
pub const CART_BADGE: Locator = Locator::xpath("//span[contains(@class,'shopping_cart_badge')]");

const ALL: &[Locator] = &[
    BURGER_BUTTON,
    CLOSE_BUTTON,
    MENU_PANEL,
    ALL_ITEMS,
    ABOUT,
    LOGOUT,
    RESET_APP_STATE,
    CART_LINK,
    CART_BADGE,
];

/// The burger menu and cart header
#[derive(Debug)]
pub struct MenuView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> MenuView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Whether the close button or the panel is displayed
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing element.
    pub async fn is_open(&self) -> ProbeResult<bool> {
        Ok(self.ctx.is_displayed_now(&CLOSE_BUTTON).await?
            || self.ctx.is_displayed_now(&MENU_PANEL).await?)
    }

    /// Negation of [`MenuView::is_open`]
    ///
    /// # Errors
    ///
    /// Same as [`MenuView::is_open`].
    pub async fn is_closed(&self) -> ProbeResult<bool> {
        Ok(!self.is_open().await?)
    }

    /// Open the menu and wait for its links
    ///
    /// # Errors
    ///
    /// [`crate::ProbeError::ElementNotFound`] if the links never show.
    pub async fn open_menu(&self) -> ProbeResult<()> {
        tracing::info!("Opening menu");
        self.ctx.actions().click(&BURGER_BUTTON).await?;
        self.ctx
            .waiter()
            .wait_for_element(&ALL_ITEMS, Condition::Visible)
            .await?;
        Ok(())
    }

    /// Close the menu and wait until it is gone
    ///
    /// # Errors
    ///
    /// [`crate::ProbeError::ConditionNotMet`] if it stays open.
    pub async fn close_menu(&self) -> ProbeResult<()> {
        tracing::info!("Closing menu");
        self.ctx.actions().click(&CLOSE_BUTTON).await?;
        let driver = self.ctx.driver();
        self.ctx
            .waiter()
            .wait_for("menu closed", || menu_closed(driver))
            .await
    }

    /// Number on the cart badge; 0 when there is no badge
    ///
    /// # Errors
    ///
    /// [`crate::ProbeError::UnparsableContent`] for a badge that is not a count.
    pub async fn cart_badge_count(&self) -> ProbeResult<u32> {
        self.wait_loaded().await?;
        self.ctx.badge_count(&CART_BADGE).await
    }

    /// Go to the catalog via "All Items"
    ///
    /// # Errors
    ///
    /// Failures opening the menu or clicking the link.
    pub async fn click_all_items(&self) -> ProbeResult<()> {
        self.click_link(&ALL_ITEMS).await
    }

    /// Follow "About"
    ///
    /// # Errors
    ///
    /// Failures opening the menu or clicking the link.
    pub async fn click_about(&self) -> ProbeResult<()> {
        self.click_link(&ABOUT).await
    }

    /// Log out
    ///
    /// # Errors
    ///
    /// Failures opening the menu or clicking the link.
    pub async fn click_logout(&self) -> ProbeResult<()> {
        self.click_link(&LOGOUT).await
    }

    /// Reset app state, then close the menu if it is still open
    ///
    /// # Errors
    ///
    /// Failures opening the menu or clicking the link. Closing afterwards is
    /// best-effort.
    pub async fn click_reset_app_state(&self) -> ProbeResult<()> {
        self.click_link(&RESET_APP_STATE).await?;
        if self.is_open().await.unwrap_or(false) {
            if let Err(e) = self.close_menu().await {
                tracing::warn!("Menu stayed open after reset: {e}");
            }
        }
        Ok(())
    }

    /// Follow the header cart link
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn open_cart(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&CART_LINK).await?;
        Ok(())
    }

    async fn click_link(&self, link: &Locator) -> ProbeResult<()> {
        if !self.is_open().await? {
            self.open_menu().await?;
        }
        self.ctx.actions().click(link).await?;
        Ok(())
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for MenuView<'_, D> {
    const NAME: &'static str = "menu";

    fn locators() -> &'static [Locator] {
        ALL
    }

    fn ready_locator(&self) -> Locator {
        BURGER_BUTTON
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }
}

async fn menu_closed<D: Driver>(driver: &D) -> DriverResult<Poll<()>> {
    let open = any_displayed(driver, &CLOSE_BUTTON).await? || any_displayed(driver, &MENU_PANEL).await?;
    Ok(if open { Poll::NotYet } else { Poll::Ready(()) })
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

    mod open_close_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_then_close() {
            let store = MockStorefront::new().logged_in();
            let telemetry = Telemetry::disabled();
            let menu = MenuView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            menu.wait_loaded().await.unwrap();
            assert!(menu.is_closed().await.unwrap());
            menu.open_menu().await.unwrap();
            assert!(menu.is_open().await.unwrap());
            menu.close_menu().await.unwrap();
            assert!(menu.is_closed().await.unwrap());
        }
    }

    mod link_tests {
        use super::*;

        #[tokio::test]
        async fn test_logout_returns_to_login() {
            let store = MockStorefront::new().logged_in();
            let telemetry = Telemetry::disabled();
            let menu = MenuView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            menu.click_logout().await.unwrap();

            assert!(!store.is_logged_in());
            assert_eq!(
                store.driver().current_url().await.unwrap(),
                format!("{}/", store.base_url())
            );
        }

        #[tokio::test]
        async fn test_reset_empties_cart_and_closes_menu() {
            let store = MockStorefront::new()
                .logged_in()
                .with_cart(&["Sauce Labs Backpack", "Sauce Labs Onesie"]);
            let telemetry = Telemetry::disabled();
            let menu = MenuView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            assert_eq!(menu.cart_badge_count().await.unwrap(), 2);
            menu.click_reset_app_state().await.unwrap();

            assert_eq!(menu.cart_badge_count().await.unwrap(), 0);
            assert!(menu.is_closed().await.unwrap());
        }

        #[tokio::test]
        async fn test_all_items_and_about() {
            let store = MockStorefront::new().logged_in();
            store.open_cart();
            let telemetry = Telemetry::disabled();
            let menu = MenuView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            menu.click_all_items().await.unwrap();
            assert!(store.driver().current_url().await.unwrap().ends_with("/inventory.html"));

            menu.click_about().await.unwrap();
            assert!(store.driver().current_url().await.unwrap().contains("saucelabs.com"));
        }

        #[tokio::test]
        async fn test_header_cart_link() {
            let store = MockStorefront::new().logged_in();
            let telemetry = Telemetry::disabled();
            let menu = MenuView::new(PageContext::new(store.driver(), &telemetry).with_spec(fast()));

            menu.open_cart().await.unwrap();
            assert!(store.driver().current_url().await.unwrap().ends_with("/cart.html"));
        }
    }

    mod readiness_tests {
        use super::*;
        use crate::mock::{MockDriver, MockNode};

        #[tokio::test]
        async fn test_badge_count_waits_for_late_header() {
            let driver = MockDriver::new();
            driver.add(MockNode::new("button").matching(BURGER_BUTTON).absent_for_polls(3));
            driver.add(MockNode::new("span").matching(CART_BADGE).with_text("2").absent_for_polls(3));
            let telemetry = Telemetry::disabled();
            let menu = MenuView::new(PageContext::new(&driver, &telemetry).with_spec(fast()));

            assert_eq!(menu.cart_badge_count().await.unwrap(), 2);
        }
    }
}
