//! Checkout step one (customer information) and step two (overview).

use crate::driver::Driver;
use crate::locator::Locator;
use crate::page_object::{parse_amount, parse_price, PageContext, PageObject};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// First name input
pub const FIRST_NAME: Locator = Locator::xpath("//input[@id='first-name']");
/// Last name input
pub const LAST_NAME: Locator = Locator::xpath("//input[@id='last-name']");
/// Postal code input
pub const POSTAL_CODE: Locator = Locator::xpath("//input[@id='postal-code']");
/// Continue to the overview
pub const CONTINUE: Locator = Locator::xpath("//input[@id='continue' or @data-test='continue']");

/// Price of each ordered line
pub const LINE_PRICE: Locator = Locator::xpath("//div[contains(@class,'inventory_item_price')]");
/// "Item total: $.." label
pub const SUBTOTAL: Locator = Locator::xpath("//div[contains(@class,'summary_subtotal_label')]");
/// "Tax: $.." label
pub const TAX: Locator = Locator::xpath("//div[contains(@class,'summary_tax_label')]");
/// "Total: $.." label
pub const TOTAL: Locator = Locator::xpath("//div[contains(@class,'summary_total_label')]");
/// Place the order
pub const FINISH: Locator = Locator::xpath("//button[@id='finish']");

const INFO_LOCATORS: &[Locator] = &[FIRST_NAME, LAST_NAME, POSTAL_CODE, CONTINUE];
const OVERVIEW_LOCATORS: &[Locator] = &[LINE_PRICE, SUBTOTAL, TAX, TOTAL, FINISH];

/// Tolerance for comparing money amounts
pub const MONEY_TOLERANCE: f64 = 0.01;

// =============================================================================
// STEP ONE
// =============================================================================

/// Customer information form
#[derive(Debug)]
pub struct CheckoutInfoView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> CheckoutInfoView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Fill all three fields
    ///
    /// # Errors
    ///
    /// Propagates the first interaction failure.
    pub async fn fill(&self, first_name: &str, last_name: &str, postal_code: &str) -> ProbeResult<()> {
        self.wait_loaded().await?;
        let actions = self.ctx.actions();
        actions.set_value(&FIRST_NAME, first_name).await?;
        actions.set_value(&LAST_NAME, last_name).await?;
        actions.set_value(&POSTAL_CODE, postal_code).await?;
        Ok(())
    }

    /// Submit the form
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn continue_to_overview(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&CONTINUE).await?;
        Ok(())
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for CheckoutInfoView<'_, D> {
    const NAME: &'static str = "checkout information";

    fn locators() -> &'static [Locator] {
        INFO_LOCATORS
    }

    fn ready_locator(&self) -> Locator {
        FIRST_NAME
    }

    fn url_fragment(&self) -> Option<&'static str> {
        Some("checkout-step-one.html")
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }
}

// =============================================================================
// STEP TWO
// =============================================================================

/// Amounts shown on the overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    /// Price of each line
    pub line_prices: Vec<f64>,
    /// Item total before tax
    pub item_total: f64,
    /// Tax
    pub tax: f64,
    /// Grand total
    pub total: f64,
}

impl CheckoutSummary {
    /// Whether the item total matches the lines and the total adds up
    #[must_use]
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        let lines: f64 = self.line_prices.iter().sum();
        (lines - self.item_total).abs() <= tolerance
            && (self.item_total + self.tax - self.total).abs() <= tolerance
    }
}

/// Order overview
#[derive(Debug)]
pub struct CheckoutOverviewView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> CheckoutOverviewView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Price of every ordered line
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] for a price that is not a number.
    pub async fn line_prices(&self) -> ProbeResult<Vec<f64>> {
        self.wait_loaded().await?;
        let driver = self.ctx.driver();
        let mut prices = Vec::new();
        for cell in driver.find_all(&LINE_PRICE).await? {
            let text = driver.text(&cell).await?;
            let price = parse_price(&text).ok_or_else(|| ProbeError::UnparsableContent {
                locator: LINE_PRICE.to_string(),
                text: text.clone(),
            })?;
            prices.push(price);
        }
        Ok(prices)
    }

    /// Item total before tax
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] if the label has no amount.
    pub async fn item_total(&self) -> ProbeResult<f64> {
        self.amount(&SUBTOTAL).await
    }

    /// Tax
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] if the label has no amount.
    pub async fn tax(&self) -> ProbeResult<f64> {
        self.amount(&TAX).await
    }

    /// Grand total
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] if the label has no amount.
    pub async fn total(&self) -> ProbeResult<f64> {
        self.amount(&TOTAL).await
    }

    /// Every amount on the page
    ///
    /// # Errors
    ///
    /// The first read that fails.
    pub async fn summary(&self) -> ProbeResult<CheckoutSummary> {
        Ok(CheckoutSummary {
            line_prices: self.line_prices().await?,
            item_total: self.item_total().await?,
            tax: self.tax().await?,
            total: self.total().await?,
        })
    }

    /// Place the order
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn finish(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&FINISH).await?;
        Ok(())
    }

    async fn amount(&self, label: &Locator) -> ProbeResult<f64> {
        self.wait_loaded().await?;
        let text = self.ctx.actions().read_text(label).await?;
        parse_amount(&text).ok_or(ProbeError::UnparsableContent {
            locator: label.to_string(),
            text,
        })
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for CheckoutOverviewView<'_, D> {
    const NAME: &'static str = "checkout overview";

    fn locators() -> &'static [Locator] {
        OVERVIEW_LOCATORS
    }

    fn ready_locator(&self) -> Locator {
        FINISH
    }

    fn url_fragment(&self) -> Option<&'static str> {
        Some("checkout-step-two.html")
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
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

    mod summary_tests {
        use super::*;

        #[test]
        fn test_consistent_summary() {
            let summary = CheckoutSummary {
                line_prices: vec![29.99, 9.99],
                item_total: 39.98,
                tax: 3.20,
                total: 43.18,
            };
            assert!(summary.is_consistent(MONEY_TOLERANCE));
        }

        #[test]
        fn test_total_mismatch_detected() {
            let summary = CheckoutSummary {
                line_prices: vec![29.99],
                item_total: 29.99,
                tax: 2.40,
                total: 40.00,
            };
            assert!(!summary.is_consistent(MONEY_TOLERANCE));
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test]
        async fn test_info_then_overview_totals() {
            let store = MockStorefront::new()
                .logged_in()
                .with_cart(&["Sauce Labs Backpack", "Sauce Labs Bike Light"]);
            store.open_path("/checkout-step-one.html");
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());

            let info = CheckoutInfoView::new(ctx);
            info.fill("Ada", "Lovelace", "12345").await.unwrap();
            info.continue_to_overview().await.unwrap();

            let overview = CheckoutOverviewView::new(ctx);
            overview.wait_arrived().await.unwrap();
            let summary = overview.summary().await.unwrap();

            assert_eq!(summary.line_prices, vec![29.99, 9.99]);
            assert!((summary.item_total - 39.98).abs() < MONEY_TOLERANCE);
            assert!(summary.is_consistent(MONEY_TOLERANCE));

            overview.finish().await.unwrap();
            assert!(store
                .driver()
                .current_url()
                .await
                .unwrap()
                .ends_with("/checkout-complete.html"));
            assert!(store.cart().is_empty());
        }

        #[tokio::test]
        async fn test_missing_postal_code_stays_on_step_one() {
            let store = MockStorefront::new().logged_in().with_cart(&["Sauce Labs Onesie"]);
            store.open_path("/checkout-step-one.html");
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());

            let info = CheckoutInfoView::new(ctx);
            info.fill("Ada", "Lovelace", "").await.unwrap();
            info.continue_to_overview().await.unwrap();

            assert!(store
                .driver()
                .current_url()
                .await
                .unwrap()
                .ends_with("/checkout-step-one.html"));
        }
    }
}
