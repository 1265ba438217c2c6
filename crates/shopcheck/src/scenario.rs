//! End-to-end scenarios and the suite runner.
//!
//! Every scenario is generic over [`Driver`], so the same flows run against a
//! real browser and against the in-memory storefront. [`run_suite`] gives each
//! scenario its own session from a [`SessionSource`], captures an
//! end-of-scenario screenshot and collects a [`SuiteReport`].

use crate::config::ProbeConfig;
use crate::credentials::{CredentialCase, CredentialsSource};
use crate::driver::Driver;
use crate::page_object::{PageContext, PageObject};
use crate::pages::checkout::MONEY_TOLERANCE;
use crate::pages::{
    CartView, CatalogView, CheckoutCompleteView, CheckoutInfoView, CheckoutOverviewView,
    DetailView, LoginView, MenuView, SortOrder, STORE_TITLE,
};
use crate::result::{DriverResult, ProbeError, ProbeResult};
use crate::session::{with_session, SessionSource};
use crate::telemetry::Telemetry;
use crate::wait::WaitSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::Level;

const STANDARD_USER: &str = "standard_user";
const PASSWORD: &str = "secret_sauce";

const BACKPACK: &str = "Sauce Labs Backpack";
const BIKE_LIGHT: &str = "Sauce Labs Bike Light";
const BOLT_SHIRT: &str = "Sauce Labs Bolt T-Shirt";
const FLEECE: &str = "Sauce Labs Fleece Jacket";
const ONESIE: &str = "Sauce Labs Onesie";

/// Name under which the credential cases are listed and skipped
pub const CREDENTIAL_GROUP: &str = "login::credentials";

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// What a running scenario works with
#[derive(Debug)]
pub struct ScenarioEnv<'a, D: Driver> {
    ctx: PageContext<'a, D>,
    base_url: &'a str,
}

impl<'a, D: Driver> ScenarioEnv<'a, D> {
    /// Scenario environment for the store at `base_url`
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>, base_url: &'a str) -> Self {
        Self { ctx, base_url }
    }

    /// Shared page context
    #[must_use]
    pub const fn ctx(&self) -> PageContext<'a, D> {
        self.ctx
    }

    /// Store URL without a trailing slash
    #[must_use]
    pub const fn base_url(&self) -> &'a str {
        self.base_url
    }

    fn driver(&self) -> &'a D {
        self.ctx.driver()
    }

    fn login(&self) -> LoginView<'a, D> {
        LoginView::new(self.ctx)
    }

    fn catalog(&self) -> CatalogView<'a, D> {
        CatalogView::new(self.ctx)
    }

    fn details(&self) -> DetailView<'a, D> {
        DetailView::new(self.ctx)
    }

    fn cart(&self) -> CartView<'a, D> {
        CartView::new(self.ctx)
    }

    fn menu(&self) -> MenuView<'a, D> {
        MenuView::new(self.ctx)
    }

    fn checkout_info(&self) -> CheckoutInfoView<'a, D> {
        CheckoutInfoView::new(self.ctx)
    }

    fn overview(&self) -> CheckoutOverviewView<'a, D> {
        CheckoutOverviewView::new(self.ctx)
    }

    fn complete(&self) -> CheckoutCompleteView<'a, D> {
        CheckoutCompleteView::new(self.ctx)
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message()))
    }
}

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}

// =============================================================================
// SCENARIOS
// =============================================================================

/// Fixed end-to-end flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Standard user reaches the catalog
    ValidLogin,
    /// Unknown user sees the mismatch banner
    InvalidLogin,
    /// Blank form asks for a username
    EmptyCredentials,
    /// Logout returns to the login form
    LogoutRedirect,
    /// Badge follows add and remove
    CatalogAddRemove,
    /// Every sort order is an ordered permutation
    CatalogSort,
    /// Details page opens and returns
    CatalogDetailsAndBack,
    /// Details URL, image and content
    DetailsUrlAndImage,
    /// Cart state survives back and forward
    DetailsPersistAcrossHistory,
    /// Header cart link from a details page
    DetailsCartFromHeader,
    /// Two lines in, one removed
    CartAddTwoRemoveOne,
    /// Continue shopping keeps the cart
    CartContinueShopping,
    /// Clearing empties the cart and is idempotent
    CartClear,
    /// Checkout opens step one
    CartCheckout,
    /// Side menu opens and closes
    MenuOpenClose,
    /// Reset app state clears the badge
    MenuResetAppState,
    /// Logout from the side menu
    MenuLogout,
    /// All items leads back to the catalog
    MenuAllItemsFromCart,
    /// About leaves the store and back returns
    MenuAboutAndBack,
    /// Two-item purchase with consistent totals
    CheckoutTwoItems,
}

impl Flow {
    /// Every flow, in run order
    pub const ALL: &'static [Self] = &[
        Self::ValidLogin,
        Self::InvalidLogin,
        Self::EmptyCredentials,
        Self::LogoutRedirect,
        Self::CatalogAddRemove,
        Self::CatalogSort,
        Self::CatalogDetailsAndBack,
        Self::DetailsUrlAndImage,
        Self::DetailsPersistAcrossHistory,
        Self::DetailsCartFromHeader,
        Self::CartAddTwoRemoveOne,
        Self::CartContinueShopping,
        Self::CartClear,
        Self::CartCheckout,
        Self::MenuOpenClose,
        Self::MenuResetAppState,
        Self::MenuLogout,
        Self::MenuAllItemsFromCart,
        Self::MenuAboutAndBack,
        Self::CheckoutTwoItems,
    ];

    /// `group::name`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ValidLogin => "login::valid_login",
            Self::InvalidLogin => "login::invalid_login",
            Self::EmptyCredentials => "login::empty_credentials",
            Self::LogoutRedirect => "login::logout_redirect",
            Self::CatalogAddRemove => "catalog::add_remove_updates_badge",
            Self::CatalogSort => "catalog::sort_name_and_price",
            Self::CatalogDetailsAndBack => "catalog::open_details_and_back",
            Self::DetailsUrlAndImage => "details::url_and_image",
            Self::DetailsPersistAcrossHistory => "details::add_persists_across_history",
            Self::DetailsCartFromHeader => "details::open_cart_from_header",
            Self::CartAddTwoRemoveOne => "cart::add_two_remove_one",
            Self::CartContinueShopping => "cart::continue_shopping_then_add",
            Self::CartClear => "cart::clear_cart",
            Self::CartCheckout => "cart::checkout_goes_to_step_one",
            Self::MenuOpenClose => "menu::open_and_close",
            Self::MenuResetAppState => "menu::reset_app_state_clears_cart",
            Self::MenuLogout => "menu::logout",
            Self::MenuAllItemsFromCart => "menu::all_items_from_cart",
            Self::MenuAboutAndBack => "menu::about_and_back",
            Self::CheckoutTwoItems => "checkout::two_items_totals",
        }
    }

    async fn run<D: Driver>(self, env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
        match self {
            Self::ValidLogin => login_succeeds(env, STANDARD_USER, PASSWORD).await,
            Self::InvalidLogin => login_rejected(env, "wrong_user", "wrongpass", "do not match any user").await,
            Self::EmptyCredentials => login_rejected(env, "", "", "Username is required").await,
            Self::LogoutRedirect => logout_redirect(env).await,
            Self::CatalogAddRemove => catalog_add_remove(env).await,
            Self::CatalogSort => catalog_sort(env).await,
            Self::CatalogDetailsAndBack => catalog_details_and_back(env).await,
            Self::DetailsUrlAndImage => details_url_and_image(env).await,
            Self::DetailsPersistAcrossHistory => details_persist_across_history(env).await,
            Self::DetailsCartFromHeader => details_cart_from_header(env).await,
            Self::CartAddTwoRemoveOne => cart_add_two_remove_one(env).await,
            Self::CartContinueShopping => cart_continue_shopping(env).await,
            Self::CartClear => cart_clear(env).await,
            Self::CartCheckout => cart_checkout(env).await,
            Self::MenuOpenClose => menu_open_close(env).await,
            Self::MenuResetAppState => menu_reset_app_state(env).await,
            Self::MenuLogout => logout_redirect(env).await,
            Self::MenuAllItemsFromCart => menu_all_items_from_cart(env).await,
            Self::MenuAboutAndBack => menu_about_and_back(env).await,
            Self::CheckoutTwoItems => checkout_two_items(env).await,
        }
    }
}

/// One runnable scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// A fixed flow
    Flow(Flow),
    /// A login attempt from the credentials file
    Credential(CredentialCase),
}

impl Scenario {
    /// Display name; credential cases are `login::credentials[<case>]`
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Flow(flow) => flow.name().to_string(),
            Self::Credential(case) => format!("{CREDENTIAL_GROUP}[{}]", case.case_id),
        }
    }

    /// Run against the store in `env`
    ///
    /// # Errors
    ///
    /// [`ProbeError::AssertionFailed`] for a behavioural mismatch, or the page
    /// object error that stopped the flow.
    pub async fn run<D: Driver>(&self, env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
        match self {
            Self::Flow(flow) => flow.run(env).await,
            Self::Credential(case) => credential_login(env, case).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// =============================================================================
// LOGIN
// =============================================================================

async fn sign_in<'a, D: Driver>(env: &ScenarioEnv<'a, D>) -> ProbeResult<CatalogView<'a, D>> {
    let login = env.login();
    login.open(env.base_url()).await?;
    login.login(STANDARD_USER, PASSWORD).await?;
    let catalog = env.catalog();
    catalog.wait_arrived().await?;
    Ok(catalog)
}

async fn login_succeeds<D: Driver>(env: &ScenarioEnv<'_, D>, username: &str, password: &str) -> ProbeResult<()> {
    let login = env.login();
    login.open(env.base_url()).await?;
    login.login(username, password).await?;

    let url = env.ctx().waiter().wait_for_url_contains("inventory.html").await?;
    tracing::info!("Logged in as {username:?}, now at {url}");
    let title = env.driver().title().await?;
    ensure(title == STORE_TITLE, || format!("expected title {STORE_TITLE:?}, got {title:?}"))
}

async fn login_rejected<D: Driver>(
    env: &ScenarioEnv<'_, D>,
    username: &str,
    password: &str,
    expected: &str,
) -> ProbeResult<()> {
    let login = env.login();
    login.open(env.base_url()).await?;
    login.login(username, password).await?;

    let message = login.error_message().await?;
    ensure(message.contains(expected), || {
        format!("error banner {message:?} does not mention {expected:?}")
    })?;
    let url = env.driver().current_url().await?;
    ensure(!url.contains("inventory.html"), || format!("rejected login navigated to {url}"))
}

async fn credential_login<D: Driver>(env: &ScenarioEnv<'_, D>, case: &CredentialCase) -> ProbeResult<()> {
    match case.expected.expected_message() {
        None => login_succeeds(env, &case.username, &case.password).await,
        Some(expected) => login_rejected(env, &case.username, &case.password, expected).await,
    }
}

async fn logout_redirect<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    sign_in(env).await?;
    env.menu().click_logout().await?;

    let landing = format!("{}/", env.base_url());
    env.ctx().waiter().wait_for_url_contains(&landing).await?;
    ensure(env.login().is_login_button_displayed().await, || {
        "login button not shown after logout".to_string()
    })
}

// =============================================================================
// CATALOG
// =============================================================================

async fn catalog_add_remove<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;

    ensure(catalog.add_to_cart(BACKPACK).await?, || format!("could not add {BACKPACK}"))?;
    let count = catalog.cart_count().await?;
    ensure(count == 1, || format!("badge should read 1 after add, got {count}"))?;

    ensure(catalog.remove_from_cart(BACKPACK).await?, || format!("could not remove {BACKPACK}"))?;
    let count = catalog.cart_count().await?;
    ensure(count == 0, || format!("badge should be gone after remove, got {count}"))
}

fn sorted_names(names: &[String]) -> Vec<String> {
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted
}

fn sorted_prices(prices: &[f64]) -> Vec<f64> {
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

async fn catalog_sort<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    let names_before = sorted_names(&catalog.item_names().await?);
    let prices_before = sorted_prices(&catalog.item_prices().await?);

    for order in SortOrder::ALL.iter().copied() {
        let outcome = catalog.sort_by(order).await?;
        tracing::info!("Sorted by {order}: {outcome}");

        let names = catalog.item_names().await?;
        let prices = catalog.item_prices().await?;
        ensure(order.is_sorted(&names, &prices), || {
            format!("{order} ordering violated: {names:?} {prices:?}")
        })?;
        ensure(sorted_names(&names) == names_before, || {
            format!("{order} changed the set of items: {names:?}")
        })?;
        ensure(sorted_prices(&prices) == prices_before, || {
            format!("{order} changed the set of prices: {prices:?}")
        })?;
    }
    Ok(())
}

async fn catalog_details_and_back<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    ensure(catalog.open_product(BACKPACK).await?, || format!("could not open {BACKPACK}"))?;

    let details = env.details();
    details.wait_arrived().await?;
    let title = details.title().await?;
    ensure(title == BACKPACK, || format!("details title {title:?}"))?;

    details.back_to_products().await?;
    env.catalog().wait_arrived().await
}

// =============================================================================
// DETAILS
// =============================================================================

async fn details_url_and_image<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    ensure(catalog.open_product(BACKPACK).await?, || format!("could not open {BACKPACK}"))?;

    let details = env.details();
    details.wait_arrived().await?;
    let item_id = details.current_item_id().await?;
    ensure(item_id.is_some(), || "details URL has no item id".to_string())?;
    ensure(!details.image_src().await?.is_empty(), || "image src is empty".to_string())?;
    ensure(details.is_image_loaded().await?, || "product image did not load".to_string())?;

    let title = details.title().await?;
    ensure(title == BACKPACK, || format!("details title {title:?}"))?;
    ensure(!details.description().await?.is_empty(), || "description is empty".to_string())?;
    let price = details.price().await?;
    ensure(price > 0.0, || format!("price should be positive, got {price}"))
}

async fn details_persist_across_history<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    ensure(catalog.open_product(BIKE_LIGHT).await?, || format!("could not open {BIKE_LIGHT}"))?;

    let details = env.details();
    details.wait_arrived().await?;
    let start = details.cart_count().await?;
    if details.add_to_cart().await? {
        ensure(details.is_in_cart().await?, || "not in cart after add".to_string())?;
        let count = details.cart_count().await?;
        ensure(count == start + 1, || format!("badge {count} after add, expected {}", start + 1))?;
    }

    env.driver().back().await?;
    env.catalog().wait_arrived().await?;
    env.driver().forward().await?;

    let details = env.details();
    details.wait_arrived().await?;
    ensure(details.is_in_cart().await?, || "cart state lost across back/forward".to_string())?;
    let count = details.cart_count().await?;
    ensure(count > start, || format!("badge {count} does not reflect the added item"))?;

    details.remove_from_cart().await?;
    ensure(!details.is_in_cart().await?, || "still in cart after remove".to_string())?;
    details.back_to_products().await?;
    env.catalog().wait_arrived().await
}

async fn details_cart_from_header<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    ensure(catalog.open_product(FLEECE).await?, || format!("could not open {FLEECE}"))?;

    let details = env.details();
    details.wait_arrived().await?;
    let start = details.cart_count().await?;
    details.add_to_cart().await?;
    let count = details.cart_count().await?;
    ensure(count > start, || format!("badge {count} did not increase from {start}"))?;

    details.open_cart_from_header().await?;
    let cart = env.cart();
    cart.wait_arrived().await?;
    cart.continue_shopping().await?;
    env.catalog().wait_arrived().await
}

// =============================================================================
// CART
// =============================================================================

async fn open_cart<'a, D: Driver>(env: &ScenarioEnv<'a, D>, catalog: &CatalogView<'a, D>) -> ProbeResult<CartView<'a, D>> {
    catalog.open_cart().await?;
    let cart = env.cart();
    cart.wait_arrived().await?;
    Ok(cart)
}

async fn cart_names<D: Driver>(cart: &CartView<'_, D>) -> ProbeResult<Vec<String>> {
    Ok(cart.cart_items().await?.into_iter().map(|line| line.name).collect())
}

async fn cart_add_two_remove_one<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    for name in [BACKPACK, BIKE_LIGHT] {
        ensure(catalog.add_to_cart(name).await?, || format!("could not add {name}"))?;
    }
    let count = catalog.cart_count().await?;
    ensure(count == 2, || format!("badge should read 2, got {count}"))?;

    let cart = open_cart(env, &catalog).await?;
    let names = cart_names(&cart).await?;
    ensure(names.len() == 2 && names.iter().any(|n| n == BACKPACK) && names.iter().any(|n| n == BIKE_LIGHT), || {
        format!("cart should hold exactly {BACKPACK} and {BIKE_LIGHT}, got {names:?}")
    })?;

    ensure(cart.remove_item(BIKE_LIGHT).await?, || format!("could not remove {BIKE_LIGHT}"))?;
    let names = cart_names(&cart).await?;
    ensure(names == [BACKPACK], || format!("cart should hold only {BACKPACK}, got {names:?}"))?;
    let count = cart.cart_count().await?;
    ensure(count == 1, || format!("badge should read 1 after removing one of two, got {count}"))
}

async fn cart_continue_shopping<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    ensure(catalog.add_to_cart(BOLT_SHIRT).await?, || format!("could not add {BOLT_SHIRT}"))?;

    let cart = open_cart(env, &catalog).await?;
    cart.continue_shopping().await?;
    let catalog = env.catalog();
    catalog.wait_arrived().await?;

    ensure(catalog.add_to_cart(ONESIE).await?, || format!("could not add {ONESIE}"))?;
    let count = catalog.cart_count().await?;
    ensure(count >= 2, || format!("badge should read at least 2, got {count}"))?;

    let cart = open_cart(env, &catalog).await?;
    let names = cart_names(&cart).await?;
    ensure(names.iter().any(|n| n == BOLT_SHIRT) && names.iter().any(|n| n == ONESIE), || {
        format!("cart is missing an item: {names:?}")
    })
}

async fn cart_clear<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    catalog.add_to_cart(FLEECE).await?;

    let cart = open_cart(env, &catalog).await?;
    let removed = cart.clear_cart().await?;
    tracing::info!("Removed {removed} items");
    ensure(cart.cart_items().await?.is_empty(), || "cart not empty after clear".to_string())?;
    let count = cart.cart_count().await?;
    ensure(count == 0, || format!("badge should be gone, got {count}"))?;

    let again = cart.clear_cart().await?;
    ensure(again == 0, || format!("clearing an empty cart removed {again}"))?;

    cart.continue_shopping().await?;
    env.catalog().wait_arrived().await
}

async fn cart_checkout<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    ensure(catalog.add_to_cart(BACKPACK).await?, || format!("could not add {BACKPACK}"))?;

    let cart = open_cart(env, &catalog).await?;
    cart.checkout().await?;
    env.checkout_info().wait_arrived().await?;

    env.driver().back().await?;
    let cart = env.cart();
    cart.wait_arrived().await?;
    cart.continue_shopping().await?;
    env.catalog().wait_arrived().await
}

// =============================================================================
// MENU
// =============================================================================

async fn menu_open_close<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    sign_in(env).await?;
    let menu = env.menu();
    menu.open_menu().await?;
    ensure(menu.is_open().await?, || "menu should be open".to_string())?;
    menu.close_menu().await?;
    ensure(menu.is_closed().await?, || "menu should be closed".to_string())
}

async fn menu_reset_app_state<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    for name in [BACKPACK, BIKE_LIGHT] {
        ensure(catalog.add_to_cart(name).await?, || format!("could not add {name}"))?;
    }
    let count = catalog.cart_count().await?;
    ensure(count >= 2, || format!("badge should read at least 2, got {count}"))?;

    let menu = env.menu();
    menu.click_reset_app_state().await?;
    let badge = menu.cart_badge_count().await?;
    ensure(badge == 0, || format!("badge should be gone after reset, got {badge}"))?;

    let catalog = env.catalog();
    ensure(catalog.add_to_cart(BACKPACK).await?, || format!("could not add {BACKPACK} after reset"))?;
    menu.click_reset_app_state().await?;
    let badge = menu.cart_badge_count().await?;
    ensure(badge == 0, || format!("badge should be gone after second reset, got {badge}"))
}

async fn menu_all_items_from_cart<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    open_cart(env, &catalog).await?;
    env.menu().click_all_items().await?;
    env.catalog().wait_arrived().await
}

async fn url_mentions<D: Driver>(driver: &D, needle: &str) -> DriverResult<bool> {
    Ok(driver.current_url().await?.to_lowercase().contains(needle))
}

async fn menu_about_and_back<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    sign_in(env).await?;
    env.menu().click_about().await?;

    let driver = env.driver();
    let reached = env
        .ctx()
        .waiter()
        .settle("about page", WaitSpec::short(), || url_mentions(driver, "sauce"))
        .await;
    if reached {
        tracing::info!("About URL: {}", driver.current_url().await?);
    } else {
        tracing::warn!("Could not verify the external About page; continuing");
    }

    driver.back().await?;
    env.catalog().wait_arrived().await
}

// =============================================================================
// CHECKOUT
// =============================================================================

async fn checkout_two_items<D: Driver>(env: &ScenarioEnv<'_, D>) -> ProbeResult<()> {
    let catalog = sign_in(env).await?;
    for name in [BACKPACK, BIKE_LIGHT] {
        ensure(catalog.add_to_cart(name).await?, || format!("could not add {name}"))?;
    }
    let cart = open_cart(env, &catalog).await?;
    cart.checkout().await?;

    let info = env.checkout_info();
    info.wait_arrived().await?;
    info.fill("Amisha", "Nath", "560001").await?;
    info.continue_to_overview().await?;

    let overview = env.overview();
    overview.wait_arrived().await?;
    let summary = overview.summary().await?;
    tracing::info!(
        "Item total {:.2}, tax {:.2}, total {:.2}",
        summary.item_total,
        summary.tax,
        summary.total
    );
    let lines: f64 = summary.line_prices.iter().sum();
    ensure(summary.line_prices.len() == 2, || {
        format!("expected 2 order lines, got {:?}", summary.line_prices)
    })?;
    ensure(close_enough(summary.item_total, lines), || {
        format!("item total {} differs from line sum {lines}", summary.item_total)
    })?;
    ensure(close_enough(summary.total, summary.item_total + summary.tax), || {
        format!(
            "total {} differs from item total + tax {}",
            summary.total,
            summary.item_total + summary.tax
        )
    })?;

    overview.finish().await?;
    let complete = env.complete();
    complete.wait_arrived().await?;
    ensure(complete.is_thank_you_visible().await, || "thank-you header not visible".to_string())?;
    complete.back_home().await?;
    env.catalog().wait_arrived().await
}

// =============================================================================
// SUITE
// =============================================================================

/// Scenarios selected for a run
#[derive(Debug, Clone, Default)]
pub struct Suite {
    scenarios: Vec<Scenario>,
    skipped: Vec<(String, String)>,
}

impl Suite {
    /// Every fixed flow
    #[must_use]
    pub fn standard() -> Self {
        Self {
            scenarios: Flow::ALL.iter().copied().map(Scenario::Flow).collect(),
            skipped: Vec::new(),
        }
    }

    /// Add one scenario per credential case, or record the group as skipped
    /// when the file does not exist
    ///
    /// # Errors
    ///
    /// [`ProbeError::Credentials`] for a malformed file.
    pub fn with_credentials(mut self, source: &CredentialsSource) -> ProbeResult<Self> {
        match source.load()? {
            Some(cases) => self.scenarios.extend(cases.into_iter().map(Scenario::Credential)),
            None => self.skipped.push((
                CREDENTIAL_GROUP.to_string(),
                format!("credentials file {} not found", source.path().display()),
            )),
        }
        Ok(self)
    }

    /// Add explicit credential cases
    #[must_use]
    pub fn with_cases(mut self, cases: impl IntoIterator<Item = CredentialCase>) -> Self {
        self.scenarios.extend(cases.into_iter().map(Scenario::Credential));
        self
    }

    /// Keep scenarios whose name contains `pattern`
    #[must_use]
    pub fn filtered(mut self, pattern: &str) -> Self {
        self.scenarios.retain(|s| s.name().contains(pattern));
        self.skipped.retain(|(name, _)| name.contains(pattern));
        self
    }

    /// Scenarios to run
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Names of the scenarios to run
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.scenarios.iter().map(Scenario::name).collect()
    }

    /// Groups skipped before the run, with the reason
    #[must_use]
    pub fn skipped(&self) -> &[(String, String)] {
        &self.skipped
    }

    /// Number of scenarios to run
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether nothing would run
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Every check held
    Passed,
    /// An assertion or page object failed
    Failed,
    /// Not run
    Skipped,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        })
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Verdict
    pub verdict: Verdict,
    /// Wall time including session start-up
    pub duration_ms: u64,
    /// Failure or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// End-of-scenario screenshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioReport {
    fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: Verdict::Skipped,
            duration_ms: 0,
            message: Some(reason.into()),
            screenshot: None,
        }
    }
}

/// Outcome of a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Store the run targeted
    pub base_url: String,
    /// Browser name
    pub browser: String,
    /// Per-scenario results, in run order
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    fn count(&self, verdict: Verdict) -> usize {
        self.scenarios.iter().filter(|s| s.verdict == verdict).count()
    }

    /// Passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(Verdict::Passed)
    }

    /// Failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Verdict::Failed)
    }

    /// Skipped scenarios
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(Verdict::Skipped)
    }

    /// Whether nothing failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Look up a scenario by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Human-readable summary, one line per scenario
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for s in &self.scenarios {
            out.push_str(&format!("{} {} ({}ms)", s.verdict, s.name, s.duration_ms));
            if let Some(message) = &s.message {
                out.push_str(&format!(": {message}"));
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "\n{} passed, {} failed, {} skipped against {} ({})\n",
            self.passed(),
            self.failed(),
            self.skipped(),
            self.base_url,
            self.browser
        ));
        out
    }
}

/// Run every scenario in `suite`, each in a fresh session from `source`.
///
/// A missing driver binary aborts the run: the scenario that hit it fails and
/// the rest are reported as skipped.
pub async fn run_suite<S: SessionSource>(
    source: &S,
    suite: &Suite,
    config: &ProbeConfig,
    telemetry: &Telemetry,
) -> SuiteReport {
    let mut report = SuiteReport {
        started_at: Utc::now(),
        base_url: config.base_url.clone(),
        browser: config.browser.to_string(),
        scenarios: Vec::with_capacity(suite.len() + suite.skipped().len()),
    };
    for (name, reason) in suite.skipped() {
        tracing::warn!("Skipping {name}: {reason}");
        report.scenarios.push(ScenarioReport::skipped(name.clone(), reason.clone()));
    }

    let session = config.session();
    let mut aborted: Option<String> = None;
    for scenario in suite.scenarios() {
        let name = scenario.name();
        if let Some(reason) = &aborted {
            report.scenarios.push(ScenarioReport::skipped(name, reason.clone()));
            continue;
        }

        tracing::info!("Running {name}");
        let started = Instant::now();
        let label = name.as_str();
        let base_url = config.base_url.as_str();
        let wait = config.wait;
        let run = with_session(source, &session, |driver| async move {
            let ctx = PageContext::new(&driver, telemetry).with_spec(wait);
            let outcome = scenario.run(&ScenarioEnv::new(ctx, base_url)).await;
            let screenshot = telemetry.capture_screenshot(&driver, label).await;
            Ok::<_, ProbeError>((outcome, screenshot))
        })
        .await;
        let (outcome, screenshot) = match run {
            Ok(pair) => pair,
            Err(e) => (Err(e), None),
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (verdict, message) = match outcome {
            Ok(()) => {
                telemetry.log_line(Level::INFO, &format!("PASS {name} ({duration_ms}ms)"));
                (Verdict::Passed, None)
            }
            Err(e) => {
                telemetry.log_line(Level::ERROR, &format!("FAIL {name}: {e}"));
                if matches!(e, ProbeError::DriverNotFound { .. }) {
                    aborted = Some(format!("run aborted: {e}"));
                }
                (Verdict::Failed, Some(e.to_string()))
            }
        };
        report.scenarios.push(ScenarioReport {
            name,
            verdict,
            duration_ms,
            message,
            screenshot,
        });
    }

    tracing::info!(
        "Suite finished: {} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped()
    );
    report
}
