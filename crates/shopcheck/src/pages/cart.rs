//! Cart page.

use crate::action::Action;
use crate::driver::Driver;
use crate::locator::Locator;
use crate::page_object::{parse_count, parse_price, PageContext, PageObject};
use crate::result::{DriverResult, ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cart list; its visibility means the page is ready
pub const CART_LIST: Locator = Locator::xpath("//div[contains(@class,'cart_list')]");
/// One cart row (exact class token, so `cart_item_label` does not match)
pub const CART_ITEM: Locator = Locator::xpath(
    "//div[contains(concat(' ', normalize-space(@class), ' '), ' cart_item ')]",
);
/// Product name inside a row
pub const ITEM_NAME: Locator = Locator::xpath(".//div[contains(@class,'inventory_item_name')]");
/// Product price inside a row
pub const ITEM_PRICE: Locator = Locator::xpath(".//div[contains(@class,'inventory_item_price')]");
/// Quantity inside a row
pub const ITEM_QTY: Locator = Locator::xpath(".//div[contains(@class,'cart_quantity')]");
/// Remove button inside a row
pub const REMOVE_BUTTON: Locator =
    Locator::xpath(".//button[contains(@class,'cart_button') or contains(.,'Remove')]");
/// Back to the catalog
pub const CONTINUE_SHOPPING: Locator = Locator::xpath("//button[@id='continue-shopping']");
/// Start checkout
pub const CHECKOUT: Locator = Locator::xpath("//button[@id='checkout']");
/// Cart badge in the header
pub const CART_BADGE: Locator = Locator::xpath("//span[contains(@class,'shopping_cart_badge')]");

const ALL: &[Locator] = &[
    CART_LIST,
    CART_ITEM,
    ITEM_NAME,
    ITEM_PRICE,
    ITEM_QTY,
    REMOVE_BUTTON,
    CONTINUE_SHOPPING,
    CHECKOUT,
    CART_BADGE,
];

/// One row of the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Quantity; 1 when the row shows none
    pub qty: u32,
}

/// The cart page
#[derive(Debug)]
pub struct CartView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> CartView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Every row, in display order.
    ///
    /// Rows without a name or price are skipped; a missing or non-numeric
    /// quantity reads as 1.
    ///
    /// # Errors
    ///
    /// [`ProbeError::PageNotLoaded`] if the cart never shows,
    /// [`ProbeError::UnparsableContent`] for a price that is not a number.
    pub async fn cart_items(&self) -> ProbeResult<Vec<CartLine>> {
        self.wait_loaded().await?;
        let mut lines = Vec::new();
        for row in self.rows().await? {
            let Ok(name) = self.ctx.child_text(&row, &ITEM_NAME).await? else {
                tracing::debug!("Skipping cart row without a name");
                continue;
            };
            let Ok(price_text) = self.ctx.child_text(&row, &ITEM_PRICE).await? else {
                tracing::debug!("Skipping cart row {name:?} without a price");
                continue;
            };
            let price = parse_price(&price_text).ok_or_else(|| ProbeError::UnparsableContent {
                locator: ITEM_PRICE.to_string(),
                text: price_text.clone(),
            })?;
            let qty = self
                .ctx
                .child_text(&row, &ITEM_QTY)
                .await?
                .ok()
                .and_then(|text| parse_count(&text))
                .unwrap_or(1);
            lines.push(CartLine { name, price, qty });
        }
        Ok(lines)
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

    /// Whether a row carries this name
    ///
    /// # Errors
    ///
    /// Same as [`CartView::cart_items`].
    pub async fn has_item(&self, name: &str) -> ProbeResult<bool> {
        Ok(self.cart_items().await?.iter().any(|line| line.name == name))
    }

    /// Remove the named row; `false` when it is not in the cart
    ///
    /// # Errors
    ///
    /// Interaction failures on the row's button.
    pub async fn remove_item(&self, name: &str) -> ProbeResult<bool> {
        self.wait_loaded().await?;
        for row in self.rows().await? {
            if self.ctx.child_text(&row, &ITEM_NAME).await? != Ok(name.to_string()) {
                continue;
            }
            let Ok(button) = self.ctx.child(&row, &REMOVE_BUTTON).await? else {
                return Ok(false);
            };
            tracing::info!("Removing {name:?} from cart");
            let before = self.rows().await?.len();
            self.click_remove(button, before).await?;
            return Ok(true);
        }
        tracing::info!("{name:?} not in cart");
        Ok(false)
    }

    /// Remove every row; returns how many were removed.
    ///
    /// Stops early when a click does not shrink the list, so a cart that
    /// refuses removal cannot loop forever.
    ///
    /// # Errors
    ///
    /// Interaction failures on a remove button.
    pub async fn clear_cart(&self) -> ProbeResult<usize> {
        self.wait_loaded().await?;
        let mut removed = 0;
        loop {
            let rows = self.rows().await?;
            let Some(first) = rows.first() else {
                break;
            };
            let Ok(button) = self.ctx.child(first, &REMOVE_BUTTON).await? else {
                tracing::warn!("Cart row without a remove button; stopping");
                break;
            };
            if !self.click_remove(button, rows.len()).await? {
                tracing::warn!("Cart did not shrink after remove; stopping");
                break;
            }
            removed += 1;
        }
        tracing::info!("Cleared {removed} item(s) from cart");
        Ok(removed)
    }

    /// Back to the catalog
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn continue_shopping(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&CONTINUE_SHOPPING).await?;
        Ok(())
    }

    /// Start checkout
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn checkout(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&CHECKOUT).await?;
        Ok(())
    }

    /// Rows right now; an empty cart is not an error
    async fn rows(&self) -> ProbeResult<Vec<D::Element>> {
        Ok(self.ctx.driver().find_all(&CART_ITEM).await?)
    }

    /// Click a remove button and wait for the row count to drop below `before`
    async fn click_remove(&self, button: D::Element, before: usize) -> ProbeResult<bool> {
        let actions = self.ctx.actions();
        actions
            .perform_on(button, &REMOVE_BUTTON, &Action::Click)
            .await?;
        let driver = self.ctx.driver();
        Ok(actions
            .expect_change("cart row count", &before, || row_count(driver))
            .await)
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for CartView<'_, D> {
    const NAME: &'static str = "cart";

    fn locators() -> &'static [Locator] {
        ALL
    }

    fn ready_locator(&self) -> Locator {
        CART_LIST
    }

    fn url_fragment(&self) -> Option<&'static str> {
        Some("cart.html")
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }
}

async fn row_count<D: Driver>(driver: &D) -> DriverResult<usize> {
    Ok(driver.find_all(&CART_ITEM).await?.len())
}
