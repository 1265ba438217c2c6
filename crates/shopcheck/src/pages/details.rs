//! Product details page.

use crate::driver::{scripts, Driver};
use crate::locator::Locator;
use crate::page_object::{parse_price, PageContext, PageObject};
use crate::result::{DriverResult, ProbeError, ProbeResult};
use crate::wait::{Condition, Poll};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Product name; its visibility means the page is ready
pub const PRODUCT_NAME: Locator = Locator::xpath("//div[contains(@class,'inventory_details_name')]");
/// Product description
pub const DESCRIPTION: Locator =
    Locator::xpath("//div[contains(@class,'inventory_details_desc')]");
/// Product price
pub const PRICE: Locator = Locator::xpath("//div[contains(@class,'inventory_details_price')]");
/// Add/remove toggle
pub const ADD_REMOVE_BUTTON: Locator = Locator::xpath("//button[contains(@class,'btn_inventory')]");
/// Back to the catalog
pub const BACK_BUTTON: Locator = Locator::xpath("//button[@id='back-to-products']");
/// Cart badge in the header
pub const CART_BADGE: Locator = Locator::xpath("//span[contains(@class,'shopping_cart_badge')]");
/// Cart link in the header
pub const CART_LINK: Locator = Locator::xpath("//a[contains(@class,'shopping_cart_link')]");
/// Product image
pub const IMAGE: Locator = Locator::xpath("//img[contains(@class,'inventory_details_img')]");

const ALL: &[Locator] = &[
    PRODUCT_NAME,
    DESCRIPTION,
    PRICE,
    ADD_REMOVE_BUTTON,
    BACK_BUTTON,
    CART_BADGE,
    CART_LINK,
    IMAGE,
];

/// Details of a single product
#[derive(Debug)]
pub struct DetailView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> DetailView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// The `id` query parameter of the current URL
    ///
    /// # Errors
    ///
    /// [`ProbeError::PageNotLoaded`] if the page never shows, or a driver error.
    pub async fn current_item_id(&self) -> ProbeResult<Option<String>> {
        self.wait_loaded().await?;
        let current = self.ctx.driver().current_url().await?;
        Ok(item_id(&current))
    }

    /// Product name
    ///
    /// # Errors
    ///
    /// [`ProbeError::PageNotLoaded`] if the page never shows.
    pub async fn title(&self) -> ProbeResult<String> {
        self.wait_loaded().await?;
        self.ctx.actions().read_text(&PRODUCT_NAME).await
    }

    /// Product description
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if the description never shows.
    pub async fn description(&self) -> ProbeResult<String> {
        self.wait_loaded().await?;
        self.ctx.actions().read_text(&DESCRIPTION).await
    }

    /// Product price
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] if the price is not a number.
    pub async fn price(&self) -> ProbeResult<f64> {
        self.wait_loaded().await?;
        let text = self.ctx.actions().read_text(&PRICE).await?;
        parse_price(&text).ok_or(ProbeError::UnparsableContent {
            locator: PRICE.to_string(),
            text,
        })
    }

    /// Image `src`, empty when the attribute is missing
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if the image never shows.
    pub async fn image_src(&self) -> ProbeResult<String> {
        let image = self.image().await?;
        Ok(self
            .ctx
            .driver()
            .attribute(&image, "src")
            .await?
            .unwrap_or_default())
    }

    /// Whether the image finished loading with real pixels
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if the image never shows.
    pub async fn is_image_loaded(&self) -> ProbeResult<bool> {
        let image = self.image().await?;
        let loaded = self
            .ctx
            .driver()
            .execute_on(scripts::IMAGE_LOADED, &image, Vec::new())
            .await?;
        Ok(matches!(loaded, Value::Bool(true)))
    }

    /// Number on the header badge; 0 when there is no badge
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] for a badge that is not a count.
    pub async fn cart_count(&self) -> ProbeResult<u32> {
        self.wait_loaded().await?;
        self.ctx.badge_count(&CART_BADGE).await
    }

    /// Whether the toggle currently offers removal
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing button.
    pub async fn is_in_cart(&self) -> ProbeResult<bool> {
        self.wait_loaded().await?;
        if !self.ctx.appears(&ADD_REMOVE_BUTTON).await {
            return Ok(false);
        }
        Ok(self
            .ctx
            .text_now(&ADD_REMOVE_BUTTON)
            .await?
            .is_ok_and(|label| label.to_lowercase().contains("remove")))
    }

    /// Add this product; `false` when it is already in the cart
    ///
    /// # Errors
    ///
    /// Interaction failures on the toggle.
    pub async fn add_to_cart(&self) -> ProbeResult<bool> {
        self.click_toggle_if("add to cart").await
    }

    /// Remove this product; `false` when it is not in the cart
    ///
    /// # Errors
    ///
    /// Interaction failures on the toggle.
    pub async fn remove_from_cart(&self) -> ProbeResult<bool> {
        self.click_toggle_if("remove").await
    }

    /// Click the toggle and wait for its label to change.
    ///
    /// Returns the new label.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ConditionNotMet`] if the label never changes.
    pub async fn toggle_add_remove(&self) -> ProbeResult<String> {
        self.wait_loaded().await?;
        let before = self.toggle_label().await?;
        self.ctx.actions().click(&ADD_REMOVE_BUTTON).await?;
        let driver = self.ctx.driver();
        let after = self
            .ctx
            .waiter()
            .wait_for("add/remove label to change", || label_other_than(driver, &before))
            .await?;
        tracing::info!("Toggle label {before:?} -> {after:?}");
        Ok(after)
    }

    /// Return to the catalog
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn back_to_products(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&BACK_BUTTON).await?;
        Ok(())
    }

    /// Follow the header cart link
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn open_cart_from_header(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&CART_LINK).await?;
        Ok(())
    }

    async fn image(&self) -> ProbeResult<D::Element> {
        self.wait_loaded().await?;
        self.ctx
            .waiter()
            .wait_for_element(&IMAGE, Condition::Visible)
            .await
    }

    async fn toggle_label(&self) -> ProbeResult<String> {
        self.ctx.actions().read_text(&ADD_REMOVE_BUTTON).await
    }

    async fn click_toggle_if(&self, wanted: &str) -> ProbeResult<bool> {
        self.wait_loaded().await?;
        let label = self.toggle_label().await?;
        if !label.to_lowercase().contains(wanted) {
            tracing::info!("Toggle reads {label:?}, nothing to do");
            return Ok(false);
        }
        let actions = self.ctx.actions();
        actions.click(&ADD_REMOVE_BUTTON).await?;
        let driver = self.ctx.driver();
        actions
            .expect_change("add/remove label", &label, || current_label(driver))
            .await;
        Ok(true)
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for DetailView<'_, D> {
    const NAME: &'static str = "details";

    fn locators() -> &'static [Locator] {
        ALL
    }

    fn ready_locator(&self) -> Locator {
        PRODUCT_NAME
    }

    fn url_fragment(&self) -> Option<&'static str> {
        Some("inventory-item.html")
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }
}

/// `id` query parameter of a details URL
fn item_id(current: &str) -> Option<String> {
    let parsed = Url::parse(current).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
}

async fn current_label<D: Driver>(driver: &D) -> DriverResult<String> {
    match driver.find_all(&ADD_REMOVE_BUTTON).await?.first() {
        Some(button) => Ok(driver.text(button).await?.trim().to_string()),
        None => Ok(String::new()),
    }
}

async fn label_other_than<D: Driver>(driver: &D, before: &str) -> DriverResult<Poll<String>> {
    let now = current_label(driver).await?;
    Ok(if !now.is_empty() && now != before {
        Poll::Ready(now)
    } else {
        Poll::NotYet
    })
}
