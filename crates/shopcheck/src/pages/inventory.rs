//! Product catalog (inventory) page.

use crate::action::{Action, InteractionOutcome};
use crate::driver::{scripts, Driver};
use crate::locator::Locator;
use crate::page_object::{not_loaded, parse_price, PageContext, PageObject};
use crate::result::{DriverResult, ProbeError, ProbeResult};
use crate::wait::Condition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog container
pub const CONTAINER: Locator = Locator::id("inventory_container");
/// One product card
pub const ITEM: Locator = Locator::css(".inventory_item");
/// Product name inside a card
pub const ITEM_NAME: Locator = Locator::css(".inventory_item_name");
/// Product price inside a card
pub const ITEM_PRICE: Locator = Locator::css(".inventory_item_price");
/// Add/remove button inside a card
pub const ITEM_BUTTON: Locator = Locator::css("button.btn_inventory");
/// Sort control, matched by either attribute
pub const SORT_SELECT: Locator = Locator::css(
    "select[data-test='product_sort_container'], select.product_sort_container",
);
/// Sort control by its test attribute only
pub const SORT_SELECT_BY_DATA_TEST: Locator =
    Locator::css("select[data-test='product_sort_container']");
/// Sort control by class only
pub const SORT_SELECT_BY_CLASS: Locator = Locator::css("select.product_sort_container");
/// Cart badge in the header
pub const CART_BADGE: Locator = Locator::css(".shopping_cart_badge");
/// Cart link in the header
pub const CART_LINK: Locator = Locator::css(".shopping_cart_link");

const SORT_CANDIDATES: &[Locator] = &[SORT_SELECT, SORT_SELECT_BY_DATA_TEST, SORT_SELECT_BY_CLASS];

const ALL: &[Locator] = &[
    CONTAINER,
    ITEM,
    ITEM_NAME,
    ITEM_PRICE,
    ITEM_BUTTON,
    SORT_SELECT,
    SORT_SELECT_BY_DATA_TEST,
    SORT_SELECT_BY_CLASS,
    CART_BADGE,
    CART_LINK,
];

// =============================================================================
// SORT ORDER
// =============================================================================

/// Catalog sort orders offered by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Name (A to Z)
    NameAsc,
    /// Name (Z to A)
    NameDesc,
    /// Price (low to high)
    PriceAsc,
    /// Price (high to low)
    PriceDesc,
}

impl SortOrder {
    /// Every order, in the control's option order
    pub const ALL: [Self; 4] = [Self::NameAsc, Self::NameDesc, Self::PriceAsc, Self::PriceDesc];

    /// Option value of the sort control
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::NameAsc => "az",
            Self::NameDesc => "za",
            Self::PriceAsc => "lohi",
            Self::PriceDesc => "hilo",
        }
    }

    /// Option label shown to the user
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A to Z)",
            Self::NameDesc => "Name (Z to A)",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
        }
    }

    /// Order for an option value
    #[must_use]
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.value() == value)
    }

    /// Whether the listing respects this order.
    ///
    /// Name orders look at `names`, price orders at `prices`.
    #[must_use]
    pub fn is_sorted(self, names: &[String], prices: &[f64]) -> bool {
        match self {
            Self::NameAsc => names.windows(2).all(|w| w[0] <= w[1]),
            Self::NameDesc => names.windows(2).all(|w| w[0] >= w[1]),
            Self::PriceAsc => prices.windows(2).all(|w| w[0] <= w[1]),
            Self::PriceDesc => prices.windows(2).all(|w| w[0] >= w[1]),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for SortOrder {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(s).ok_or_else(|| ProbeError::Config {
            message: format!("unknown sort order {s:?} (expected az, za, lohi or hilo)"),
        })
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// The product listing shown after login
#[derive(Debug)]
pub struct CatalogView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> CatalogView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Product names in display order
    ///
    /// # Errors
    ///
    /// [`ProbeError::PageNotLoaded`] if the catalog never shows.
    pub async fn item_names(&self) -> ProbeResult<Vec<String>> {
        self.wait_loaded().await?;
        let mut names = Vec::new();
        for card in self.cards().await? {
            if let Ok(name) = self.ctx.child_text(&card, &ITEM_NAME).await? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Product prices in display order
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] for a price that is not a number.
    pub async fn item_prices(&self) -> ProbeResult<Vec<f64>> {
        self.wait_loaded().await?;
        let mut prices = Vec::new();
        for card in self.cards().await? {
            let Ok(text) = self.ctx.child_text(&card, &ITEM_PRICE).await? else {
                continue;
            };
            let price = parse_price(&text).ok_or_else(|| ProbeError::UnparsableContent {
                locator: ITEM_PRICE.to_string(),
                text: text.clone(),
            })?;
            prices.push(price);
        }
        Ok(prices)
    }

    /// Number on the cart badge; 0 when there is no badge
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] for a badge that is not a count.
    pub async fn cart_count(&self) -> ProbeResult<u32> {
        self.wait_loaded().await?;
        self.ctx.badge_count(&CART_BADGE).await
    }

    /// Add the named product.
    ///
    /// Returns `false` when the product is missing or already in the cart.
    ///
    /// # Errors
    ///
    /// Interaction failures on the card's button.
    pub async fn add_to_cart(&self, name: &str) -> ProbeResult<bool> {
        self.toggle_card(name, "add to cart").await
    }

    /// Remove the named product.
    ///
    /// Returns `false` when the product is missing or not in the cart.
    ///
    /// # Errors
    ///
    /// Interaction failures on the card's button.
    pub async fn remove_from_cart(&self, name: &str) -> ProbeResult<bool> {
        self.toggle_card(name, "remove").await
    }

    /// Apply a sort order.
    ///
    /// The control is found by [`crate::wait::WaitEngine::first_of`] over
    /// its selector variants and set through the resilient select chain, so a
    /// control that rejects native selection is still set by script. Returns
    /// how the selection went through.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if no variant of the control appears,
    /// [`ProbeError::InteractionFallbackExhausted`] if no attempt sets it.
    pub async fn sort_by(&self, order: SortOrder) -> ProbeResult<InteractionOutcome> {
        let before = self.item_names().await?;
        let driver = self.ctx.driver();
        tracing::info!("Sorting catalog by {} ({})", order.label(), order.value());

        for script in [scripts::SCROLL_TO_BOTTOM, scripts::SCROLL_TO_TOP] {
            if let Err(e) = driver.execute(script, Vec::new()).await {
                tracing::debug!("Scroll before sorting failed: {e}");
            }
        }

        let select = self.ctx.waiter().first_of(SORT_CANDIDATES).await?;
        let action = Action::SelectOption(order.value().to_string());
        let outcome = self
            .ctx
            .actions()
            .perform_on(select, &SORT_SELECT, &action)
            .await?;

        if !self.ctx.appears(&CONTAINER).await {
            tracing::warn!("Catalog container not visible after sorting");
        }
        self.ctx
            .actions()
            .expect_change("catalog order", &before, || listed_names(driver))
            .await;
        Ok(outcome)
    }

    /// Value the sort control currently reports
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if no variant of the control appears.
    pub async fn current_sort(&self) -> ProbeResult<Option<SortOrder>> {
        let select = self.ctx.waiter().first_of(SORT_CANDIDATES).await?;
        let value = self.ctx.driver().attribute(&select, "value").await?;
        Ok(value.as_deref().and_then(SortOrder::from_value))
    }

    /// Open the details page of the named product.
    ///
    /// Returns `false` when no card carries that name.
    ///
    /// # Errors
    ///
    /// Interaction failures on the product link.
    pub async fn open_product(&self, name: &str) -> ProbeResult<bool> {
        self.wait_loaded().await?;
        let Some(card) = self.find_card(name).await? else {
            tracing::warn!("Product {name:?} not listed");
            return Ok(false);
        };
        let Ok(link) = self.ctx.child(&card, &ITEM_NAME).await? else {
            return Ok(false);
        };
        tracing::info!("Opening product {name:?}");
        self.ctx
            .actions()
            .perform_on(link, &ITEM_NAME, &Action::Click)
            .await?;
        Ok(true)
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

    async fn cards(&self) -> ProbeResult<Vec<D::Element>> {
        self.ctx.waiter().wait_for_all(&ITEM).await
    }

    async fn find_card(&self, name: &str) -> ProbeResult<Option<D::Element>> {
        for card in self.cards().await? {
            if self.ctx.child_text(&card, &ITEM_NAME).await? == Ok(name.to_string()) {
                return Ok(Some(card));
            }
        }
        Ok(None)
    }

    /// Click the card's button when its label contains `wanted`
    async fn toggle_card(&self, name: &str, wanted: &str) -> ProbeResult<bool> {
        self.wait_loaded().await?;
        let Some(card) = self.find_card(name).await? else {
            tracing::warn!("Product {name:?} not listed");
            return Ok(false);
        };
        let Ok(button) = self.ctx.child(&card, &ITEM_BUTTON).await? else {
            return Ok(false);
        };
        let driver = self.ctx.driver();
        let label = driver.text(&button).await?;
        if !label.to_lowercase().contains(wanted) {
            tracing::info!("{name}: button reads {label:?}, nothing to do");
            return Ok(false);
        }

        tracing::info!("{name}: clicking {label:?}");
        let actions = self.ctx.actions();
        actions.perform_on(button, &ITEM_BUTTON, &Action::Click).await?;
        actions
            .expect_change(&format!("{name} button label"), &label, || {
                card_button_label(driver, name)
            })
            .await;
        Ok(true)
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for CatalogView<'_, D> {
    const NAME: &'static str = "inventory";

    fn locators() -> &'static [Locator] {
        ALL
    }

    fn ready_locator(&self) -> Locator {
        CONTAINER
    }

    fn url_fragment(&self) -> Option<&'static str> {
        Some("inventory.html")
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }

    async fn wait_loaded(&self) -> ProbeResult<()> {
        let waiter = self.ctx.waiter();
        waiter
            .wait_for_element(&CONTAINER, Condition::Visible)
            .await
            .map_err(|e| not_loaded(Self::NAME, e))?;
        waiter
            .wait_for_all(&ITEM)
            .await
            .map_err(|e| not_loaded(Self::NAME, e))?;
        Ok(())
    }
}

/// Names as currently rendered, for change detection
async fn listed_names<D: Driver>(driver: &D) -> DriverResult<Vec<String>> {
    let mut names = Vec::new();
    for card in driver.find_all(&ITEM).await? {
        if let Some(name) = driver.find_all_in(&card, &ITEM_NAME).await?.first() {
            names.push(driver.text(name).await?.trim().to_string());
        }
    }
    Ok(names)
}

/// Label of the named card's button as currently rendered
async fn card_button_label<D: Driver>(driver: &D, name: &str) -> DriverResult<String> {
    for card in driver.find_all(&ITEM).await? {
        let Some(title) = driver.find_all_in(&card, &ITEM_NAME).await?.into_iter().next() else {
            continue;
        };
        if driver.text(&title).await?.trim() != name {
            continue;
        }
        if let Some(button) = driver.find_all_in(&card, &ITEM_BUTTON).await?.first() {
            return driver.text(button).await;
        }
    }
    Ok(String::new())
}
