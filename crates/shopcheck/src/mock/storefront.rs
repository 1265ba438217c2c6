//! In-memory Sauce Demo storefront.
//!
//! Renders each store page into a [`MockDriver`] document, tagging nodes with
//! the page modules' locators, and reacts to clicks and selections the way
//! the real store does: login checks, cart toggles, sorting, the side menu
//! and the checkout steps. Every state change re-renders the page, so element
//! handles taken before an action go stale after it.

use crate::driver::Driver;
use crate::mock::driver::{MockDriver, MockNode};
use crate::pages::inventory::SortOrder;
use crate::pages::{cart, checkout, checkout_complete, details, inventory, login, menu, STORE_TITLE};
use crate::result::ProbeResult;
use crate::session::{BrowserSession, SessionConfig, SessionSource};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Base URL the storefront answers on
pub const BASE_URL: &str = "https://www.saucedemo.com";

/// Where "About" leads
pub const ABOUT_URL: &str = "https://saucelabs.com/";

const STORE_HOST: &str = "www.saucedemo.com";
const TAX_RATE: f64 = 0.08;
const VALID_PASSWORD: &str = "secret_sauce";
const ACCEPTED_USERS: &[&str] = &[
    "standard_user",
    "problem_user",
    "performance_glitch_user",
    "error_user",
    "visual_user",
];
const LOCKED_USER: &str = "locked_out_user";

/// A product in the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreProduct {
    /// Value of the details page `id` parameter
    pub id: u32,
    /// Display name
    pub name: &'static str,
    /// Unit price
    pub price: f64,
    /// Details page description
    pub description: &'static str,
    /// Image file name
    pub image: &'static str,
}

/// The catalog, in default (name ascending) order
pub const PRODUCTS: &[StoreProduct] = &[
    StoreProduct {
        id: 4,
        name: "Sauce Labs Backpack",
        price: 29.99,
        description: "carry.allTheThings() with the sleek, streamlined Sly Pack that melds \
                      uncompromising style with unequaled laptop and tablet protection.",
        image: "sauce-backpack-1200x1500.jpg",
    },
    StoreProduct {
        id: 0,
        name: "Sauce Labs Bike Light",
        price: 9.99,
        description: "A red light isn't the desired state in testing but it sure helps when \
                      riding your bike at night.",
        image: "bike-light-1200x1500.jpg",
    },
    StoreProduct {
        id: 1,
        name: "Sauce Labs Bolt T-Shirt",
        price: 15.99,
        description: "Get your testing superhero on with the Sauce Labs bolt T-shirt.",
        image: "bolt-shirt-1200x1500.jpg",
    },
    StoreProduct {
        id: 5,
        name: "Sauce Labs Fleece Jacket",
        price: 49.99,
        description: "A midweight quarter-zip fleece jacket for a relaxing day outdoors or a \
                      busy day at the office.",
        image: "sauce-pullover-1200x1500.jpg",
    },
    StoreProduct {
        id: 2,
        name: "Sauce Labs Onesie",
        price: 7.99,
        description: "Rib snap infant onesie for the junior automation engineer in development.",
        image: "red-onesie-1200x1500.jpg",
    },
    StoreProduct {
        id: 3,
        name: "Test.allTheThings() T-Shirt (Red)",
        price: 15.99,
        description: "This classic Sauce Labs t-shirt is perfect to wear when cozying up to \
                      your keyboard to automate a few tests.",
        image: "red-tatt-1200x1500.jpg",
    },
];

fn product(id: u32) -> Option<&'static StoreProduct> {
    PRODUCTS.iter().find(|p| p.id == id)
}

fn product_named(name: &str) -> Option<&'static StoreProduct> {
    PRODUCTS.iter().find(|p| p.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Login,
    Inventory,
    Details(u32),
    Cart,
    CheckoutInfo,
    CheckoutOverview,
    CheckoutComplete,
    Elsewhere,
}

impl Route {
    fn parse(raw: &str) -> Self {
        let Ok(parsed) = Url::parse(raw) else {
            return Self::Elsewhere;
        };
        if parsed.host_str() != Some(STORE_HOST) {
            return Self::Elsewhere;
        }
        match parsed.path() {
            "" | "/" => Self::Login,
            "/inventory.html" => Self::Inventory,
            "/inventory-item.html" => parsed
                .query_pairs()
                .find(|(k, _)| k == "id")
                .and_then(|(_, v)| v.parse().ok())
                .map_or(Self::Inventory, Self::Details),
            "/cart.html" => Self::Cart,
            "/checkout-step-one.html" => Self::CheckoutInfo,
            "/checkout-step-two.html" => Self::CheckoutOverview,
            "/checkout-complete.html" => Self::CheckoutComplete,
            _ => Self::Elsewhere,
        }
    }

    const fn needs_login(self) -> bool {
        !matches!(self, Self::Login | Self::Elsewhere)
    }
}

#[derive(Debug, Clone)]
struct StoreState {
    route: Route,
    logged_in: bool,
    cart: Vec<u32>,
    sort: SortOrder,
    menu_open: bool,
    login_error: Option<String>,
    checkout_error: Option<String>,
    broken_images: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            route: Route::Elsewhere,
            logged_in: false,
            cart: Vec::new(),
            sort: SortOrder::NameAsc,
            menu_open: false,
            login_error: None,
            checkout_error: None,
            broken_images: false,
        }
    }
}

type Shared = Arc<Mutex<StoreState>>;

fn lock(state: &Shared) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sauce Demo rendered into a [`MockDriver`]
#[derive(Clone)]
pub struct MockStorefront {
    driver: MockDriver,
    state: Shared,
}

impl fmt::Debug for MockStorefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStorefront")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

impl Default for MockStorefront {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorefront {
    /// A logged-out store; nothing is rendered until the first navigation
    #[must_use]
    pub fn new() -> Self {
        let driver = MockDriver::new();
        let state: Shared = Arc::new(Mutex::new(StoreState::default()));
        let routed = Arc::clone(&state);
        driver.on_navigate(move |d, url| route(d, &routed, url));
        Self { driver, state }
    }

    /// Log in directly and land on the catalog
    #[must_use]
    pub fn logged_in(self) -> Self {
        lock(&self.state).logged_in = true;
        self.open_path("/inventory.html");
        self
    }

    /// Put products in the cart by name and re-render
    #[must_use]
    pub fn with_cart(self, names: &[&str]) -> Self {
        {
            let mut state = lock(&self.state);
            for name in names {
                if let Some(p) = product_named(name) {
                    if !state.cart.contains(&p.id) {
                        state.cart.push(p.id);
                    }
                }
            }
        }
        render(&self.driver, &self.state);
        self
    }

    /// Serve product images that never finish loading
    #[must_use]
    pub fn with_broken_images(self) -> Self {
        lock(&self.state).broken_images = true;
        render(&self.driver, &self.state);
        self
    }

    /// Base URL to hand to page objects
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        BASE_URL
    }

    /// The underlying driver
    #[must_use]
    pub const fn driver(&self) -> &MockDriver {
        &self.driver
    }

    /// Navigate to a store path such as `/cart.html`
    pub fn open_path(&self, path: &str) {
        self.driver.navigate(&format!("{BASE_URL}{path}"));
    }

    /// Navigate to a product's details page
    pub fn open_product(&self, id: u32) {
        self.open_path(&format!("/inventory-item.html?id={id}"));
    }

    /// Navigate to the cart
    pub fn open_cart(&self) {
        self.open_path("/cart.html");
    }

    /// Product names in the cart, in the order they were added
    #[must_use]
    pub fn cart(&self) -> Vec<String> {
        lock(&self.state)
            .cart
            .iter()
            .filter_map(|id| product(*id))
            .map(|p| p.name.to_string())
            .collect()
    }

    /// Current catalog sort order
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        lock(&self.state).sort
    }

    /// Whether a user is logged in
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        lock(&self.state).logged_in
    }

    /// Whether the side menu is open
    #[must_use]
    pub fn is_menu_open(&self) -> bool {
        lock(&self.state).menu_open
    }
}

// =============================================================================
// ROUTING
// =============================================================================

fn route(d: &MockDriver, state: &Shared, url: &str) {
    let target = Route::parse(url);
    let redirect = {
        let mut s = lock(state);
        s.menu_open = false;
        if target.needs_login() && !s.logged_in {
            let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();
            s.login_error = Some(format!(
                "Epic sadface: You can only access '{path}' when you are logged in."
            ));
            true
        } else {
            s.route = target;
            false
        }
    };
    if redirect {
        d.navigate(&format!("{BASE_URL}/"));
    } else {
        render(d, state);
    }
}

fn go(d: &MockDriver, path: &str) {
    d.navigate(&format!("{BASE_URL}{path}"));
}

fn render(d: &MockDriver, state: &Shared) {
    let snapshot = {
        let mut s = lock(state);
        let snapshot = s.clone();
        if s.route == Route::Login {
            s.login_error = None;
        }
        snapshot
    };
    d.clear_dom();
    match snapshot.route {
        Route::Elsewhere => {
            d.set_title("");
            return;
        }
        Route::Login => {
            d.set_title(STORE_TITLE);
            render_login(d, state, &snapshot);
            return;
        }
        _ => d.set_title(STORE_TITLE),
    }
    render_header(d, state, &snapshot);
    match snapshot.route {
        Route::Inventory => render_inventory(d, state, &snapshot),
        Route::Details(id) => render_details(d, state, &snapshot, id),
        Route::Cart => render_cart(d, state, &snapshot),
        Route::CheckoutInfo => render_checkout_info(d, state, &snapshot),
        Route::CheckoutOverview => render_checkout_overview(d, state, &snapshot),
        Route::CheckoutComplete => render_complete(d),
        Route::Login | Route::Elsewhere => {}
    }
}

fn toggle_cart(d: &MockDriver, state: &Shared, id: u32) {
    {
        let mut s = lock(state);
        if let Some(pos) = s.cart.iter().position(|c| *c == id) {
            s.cart.remove(pos);
        } else {
            s.cart.push(id);
        }
    }
    render(d, state);
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn cart_label(in_cart: bool) -> &'static str {
    if in_cart {
        "Remove"
    } else {
        "Add to cart"
    }
}

// =============================================================================
// PAGES
// =============================================================================

fn render_login(d: &MockDriver, state: &Shared, snapshot: &StoreState) {
    let form = d.add(MockNode::new("form"));
    let user = d.add_child(
        form,
        MockNode::new("input").matching(login::USERNAME).with_value(""),
    );
    let pass = d.add_child(
        form,
        MockNode::new("input").matching(login::PASSWORD).with_value(""),
    );
    let st = Arc::clone(state);
    d.add_child(
        form,
        MockNode::new("input")
            .matching(login::LOGIN_BUTTON)
            .with_attr("value", "Login")
            .on_click(move |d, _| {
                let username = d.value_of(user).unwrap_or_default();
                let password = d.value_of(pass).unwrap_or_default();
                match check_credentials(&username, &password) {
                    Ok(()) => {
                        lock(&st).logged_in = true;
                        go(d, "/inventory.html");
                    }
                    Err(message) => {
                        lock(&st).login_error = Some(message.to_string());
                        render(d, &st);
                    }
                }
            }),
    );
    if let Some(message) = &snapshot.login_error {
        d.add_child(
            form,
            MockNode::new("h3")
                .matching(login::ERROR_MESSAGE)
                .with_text(message.clone()),
        );
    }
}

fn check_credentials(username: &str, password: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Epic sadface: Username is required");
    }
    if password.is_empty() {
        return Err("Epic sadface: Password is required");
    }
    if password == VALID_PASSWORD {
        if username == LOCKED_USER {
            return Err("Epic sadface: Sorry, this user has been locked out.");
        }
        if ACCEPTED_USERS.contains(&username) {
            return Ok(());
        }
    }
    Err("Epic sadface: Username and password do not match any user in this service")
}

fn render_header(d: &MockDriver, state: &Shared, snapshot: &StoreState) {
    let header = d.add(MockNode::new("div"));

    let st = Arc::clone(state);
    d.add_child(
        header,
        MockNode::new("button")
            .matching(menu::BURGER_BUTTON)
            .on_click(move |d, _| {
                lock(&st).menu_open = true;
                render(d, &st);
            }),
    );

    let mut panel = MockNode::new("nav").matching(menu::MENU_PANEL);
    let mut close = MockNode::new("button").matching(menu::CLOSE_BUTTON);
    if !snapshot.menu_open {
        panel = panel.hidden();
        close = close.hidden();
    }
    let st = Arc::clone(state);
    d.add_child(
        header,
        close.on_click(move |d, _| {
            lock(&st).menu_open = false;
            render(d, &st);
        }),
    );
    let panel = d.add_child(header, panel);
    d.add_child(
        panel,
        MockNode::new("a")
            .matching(menu::ALL_ITEMS)
            .with_text("All Items")
            .on_click(|d, _| go(d, "/inventory.html")),
    );
    d.add_child(
        panel,
        MockNode::new("a")
            .matching(menu::ABOUT)
            .with_text("About")
            .on_click(|d, _| d.navigate(ABOUT_URL)),
    );
    let st = Arc::clone(state);
    d.add_child(
        panel,
        MockNode::new("a")
            .matching(menu::LOGOUT)
            .with_text("Logout")
            .on_click(move |d, _| {
                lock(&st).logged_in = false;
                go(d, "/");
            }),
    );
    let st = Arc::clone(state);
    d.add_child(
        panel,
        MockNode::new("a")
            .matching(menu::RESET_APP_STATE)
            .with_text("Reset App State")
            .on_click(move |d, _| {
                {
                    let mut s = lock(&st);
                    s.cart.clear();
                    s.sort = SortOrder::NameAsc;
                }
                render(d, &st);
            }),
    );

    let cart_link = d.add_child(
        header,
        MockNode::new("a")
            .matching(inventory::CART_LINK)
            .matching(menu::CART_LINK)
            .on_click(|d, _| go(d, "/cart.html")),
    );
    if !snapshot.cart.is_empty() {
        d.add_child(
            cart_link,
            MockNode::new("span")
                .matching(inventory::CART_BADGE)
                .matching(menu::CART_BADGE)
                .with_text(snapshot.cart.len().to_string()),
        );
    }
}

fn render_inventory(d: &MockDriver, state: &Shared, snapshot: &StoreState) {
    let container = d.add(MockNode::new("div").matching(inventory::CONTAINER));

    let values: Vec<&str> = SortOrder::ALL.iter().map(|o| o.value()).collect();
    let st = Arc::clone(state);
    d.add_child(
        container,
        MockNode::new("select")
            .matching(inventory::SORT_SELECT)
            .matching(inventory::SORT_SELECT_BY_DATA_TEST)
            .matching(inventory::SORT_SELECT_BY_CLASS)
            .with_options(&values)
            .with_value(snapshot.sort.value())
            .on_change(move |d, value| {
                if let Some(order) = SortOrder::from_value(value) {
                    lock(&st).sort = order;
                }
                render(d, &st);
            }),
    );

    let mut listed: Vec<&StoreProduct> = PRODUCTS.iter().collect();
    match snapshot.sort {
        SortOrder::NameAsc => listed.sort_by(|a, b| a.name.cmp(b.name)),
        SortOrder::NameDesc => listed.sort_by(|a, b| b.name.cmp(a.name)),
        SortOrder::PriceAsc => listed.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::PriceDesc => listed.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }

    for p in listed {
        let id = p.id;
        let card = d.add_child(container, MockNode::new("div").matching(inventory::ITEM));
        d.add_child(
            card,
            MockNode::new("div")
                .matching(inventory::ITEM_NAME)
                .with_text(p.name)
                .on_click(move |d, _| go(d, &format!("/inventory-item.html?id={id}"))),
        );
        d.add_child(
            card,
            MockNode::new("div")
                .matching(inventory::ITEM_PRICE)
                .with_text(money(p.price)),
        );
        let st = Arc::clone(state);
        d.add_child(
            card,
            MockNode::new("button")
                .matching(inventory::ITEM_BUTTON)
                .with_text(cart_label(snapshot.cart.contains(&id)))
                .on_click(move |d, _| toggle_cart(d, &st, id)),
        );
    }
}

fn render_details(d: &MockDriver, state: &Shared, snapshot: &StoreState, id: u32) {
    let container = d.add(MockNode::new("div"));
    let Some(p) = product(id) else {
        d.add_child(
            container,
            MockNode::new("div")
                .matching(details::PRODUCT_NAME)
                .with_text("ITEM NOT FOUND"),
        );
        return;
    };
    d.add_child(
        container,
        MockNode::new("img")
            .matching(details::IMAGE)
            .with_attr("src", format!("/static/media/{}", p.image))
            .with_attr("loaded", if snapshot.broken_images { "false" } else { "true" }),
    );
    d.add_child(
        container,
        MockNode::new("div")
            .matching(details::PRODUCT_NAME)
            .with_text(p.name),
    );
    d.add_child(
        container,
        MockNode::new("div")
            .matching(details::DESCRIPTION)
            .with_text(p.description),
    );
    d.add_child(
        container,
        MockNode::new("div")
            .matching(details::PRICE)
            .with_text(money(p.price)),
    );
    let st = Arc::clone(state);
    d.add_child(
        container,
        MockNode::new("button")
            .matching(details::ADD_REMOVE_BUTTON)
            .with_text(cart_label(snapshot.cart.contains(&id)))
            .on_click(move |d, _| toggle_cart(d, &st, id)),
    );
    d.add_child(
        container,
        MockNode::new("button")
            .matching(details::BACK_BUTTON)
            .with_text("Back to products")
            .on_click(|d, _| go(d, "/inventory.html")),
    );
}

fn render_cart(d: &MockDriver, state: &Shared, snapshot: &StoreState) {
    let list = d.add(MockNode::new("div").matching(cart::CART_LIST));
    for id in &snapshot.cart {
        let Some(p) = product(*id) else {
            continue;
        };
        let id = p.id;
        let row = d.add_child(list, MockNode::new("div").matching(cart::CART_ITEM));
        d.add_child(
            row,
            MockNode::new("div").matching(cart::ITEM_QTY).with_text("1"),
        );
        let label = d.add_child(row, MockNode::new("div"));
        d.add_child(
            label,
            MockNode::new("div").matching(cart::ITEM_NAME).with_text(p.name),
        );
        d.add_child(
            label,
            MockNode::new("div")
                .matching(cart::ITEM_PRICE)
                .with_text(money(p.price)),
        );
        let st = Arc::clone(state);
        d.add_child(
            label,
            MockNode::new("button")
                .matching(cart::REMOVE_BUTTON)
                .with_text("Remove")
                .on_click(move |d, _| toggle_cart(d, &st, id)),
        );
    }
    d.add(
        MockNode::new("button")
            .matching(cart::CONTINUE_SHOPPING)
            .with_text("Continue Shopping")
            .on_click(|d, _| go(d, "/inventory.html")),
    );
    d.add(
        MockNode::new("button")
            .matching(cart::CHECKOUT)
            .with_text("Checkout")
            .on_click(|d, _| go(d, "/checkout-step-one.html")),
    );
}

fn render_checkout_info(d: &MockDriver, state: &Shared, snapshot: &StoreState) {
    let form = d.add(MockNode::new("form"));
    let first = d.add_child(
        form,
        MockNode::new("input").matching(checkout::FIRST_NAME).with_value(""),
    );
    let last = d.add_child(
        form,
        MockNode::new("input").matching(checkout::LAST_NAME).with_value(""),
    );
    let postal = d.add_child(
        form,
        MockNode::new("input").matching(checkout::POSTAL_CODE).with_value(""),
    );
    let st = Arc::clone(state);
    d.add_child(
        form,
        MockNode::new("input")
            .matching(checkout::CONTINUE)
            .with_attr("value", "Continue")
            .on_click(move |d, _| {
                let missing = [
                    (first, "First Name"),
                    (last, "Last Name"),
                    (postal, "Postal Code"),
                ]
                .into_iter()
                .find(|(field, _)| d.value_of(*field).unwrap_or_default().is_empty());
                match missing {
                    Some((_, label)) => {
                        lock(&st).checkout_error = Some(format!("Error: {label} is required"));
                        render(d, &st);
                    }
                    None => {
                        lock(&st).checkout_error = None;
                        go(d, "/checkout-step-two.html");
                    }
                }
            }),
    );
    if let Some(message) = &snapshot.checkout_error {
        d.add_child(
            form,
            MockNode::new("h3")
                .matching(login::ERROR_MESSAGE)
                .with_text(message.clone()),
        );
    }
}

fn render_checkout_overview(d: &MockDriver, state: &Shared, snapshot: &StoreState) {
    let list = d.add(MockNode::new("div"));
    let mut item_total = 0.0;
    for p in snapshot.cart.iter().filter_map(|id| product(*id)) {
        item_total += p.price;
        let row = d.add_child(list, MockNode::new("div"));
        d.add_child(row, MockNode::new("div").with_text(p.name));
        d.add_child(
            row,
            MockNode::new("div")
                .matching(checkout::LINE_PRICE)
                .with_text(money(p.price)),
        );
    }
    let tax = (item_total * TAX_RATE * 100.0).round() / 100.0;
    let summary = d.add(MockNode::new("div"));
    d.add_child(
        summary,
        MockNode::new("div")
            .matching(checkout::SUBTOTAL)
            .with_text(format!("Item total: {}", money(item_total))),
    );
    d.add_child(
        summary,
        MockNode::new("div")
            .matching(checkout::TAX)
            .with_text(format!("Tax: {}", money(tax))),
    );
    d.add_child(
        summary,
        MockNode::new("div")
            .matching(checkout::TOTAL)
            .with_text(format!("Total: {}", money(item_total + tax))),
    );
    let st = Arc::clone(state);
    d.add_child(
        summary,
        MockNode::new("button")
            .matching(checkout::FINISH)
            .with_text("Finish")
            .on_click(move |d, _| {
                lock(&st).cart.clear();
                go(d, "/checkout-complete.html");
            }),
    );
}

fn render_complete(d: &MockDriver) {
    let container = d.add(MockNode::new("div").matching(checkout_complete::CONTAINER));
    d.add_child(
        container,
        MockNode::new("h2")
            .matching(checkout_complete::HEADER)
            .with_text("Thank you for your order!"),
    );
    d.add_child(
        container,
        MockNode::new("div").matching(checkout_complete::BODY).with_text(
            "Your order has been dispatched, and will arrive just as fast as the pony can get there!",
        ),
    );
    d.add_child(
        container,
        MockNode::new("button")
            .matching(checkout_complete::BACK_HOME)
            .with_text("Back Home")
            .on_click(|d, _| go(d, "/inventory.html")),
    );
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Hands out a fresh logged-out storefront per session
#[derive(Debug, Clone, Default)]
pub struct StorefrontSessions {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    broken_images: bool,
}

impl StorefrontSessions {
    /// Sessions on a healthy store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions whose product images never load
    #[must_use]
    pub const fn with_broken_images(mut self) -> Self {
        self.broken_images = true;
        self
    }

    /// Sessions opened so far
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sessions closed so far
    #[must_use]
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSource for StorefrontSessions {
    type Session = StorefrontSession;

    async fn open(&self, config: &SessionConfig) -> ProbeResult<StorefrontSession> {
        tracing::debug!("Opening in-memory {} session", config.browser);
        let mut store = MockStorefront::new();
        if self.broken_images {
            store = store.with_broken_images();
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(StorefrontSession {
            store,
            closed: Arc::clone(&self.closed),
        })
    }
}

/// One in-memory session
#[derive(Debug)]
pub struct StorefrontSession {
    store: MockStorefront,
    closed: Arc<AtomicUsize>,
}

impl StorefrontSession {
    /// The store behind the session
    #[must_use]
    pub const fn store(&self) -> &MockStorefront {
        &self.store
    }
}

#[async_trait]
impl BrowserSession for StorefrontSession {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        self.store.driver()
    }

    async fn close(self) {
        if let Err(e) = self.store.driver().quit().await {
            tracing::warn!("Quitting in-memory session failed: {e}");
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
