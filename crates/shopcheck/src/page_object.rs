//! Page Object Model support.
//!
//! Every view wraps a [`PageContext`] and implements [`PageObject`]:
//! a readiness wait on the page's defining element, getters that treat a
//! legitimately missing element as [`Absent`], and actions built on
//! [`ResilientAction`].

use crate::action::ResilientAction;
use crate::driver::Driver;
use crate::locator::Locator;
use crate::result::{DriverErrorKind, DriverResult, ProbeError, ProbeResult};
use crate::telemetry::Telemetry;
use crate::wait::{Condition, WaitEngine, WaitSpec};
use async_trait::async_trait;
use std::fmt;

/// An element the UI legitimately does not show (empty cart badge, no error banner)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Absent;

/// Outcome of a lookup that may be legitimately absent
pub type Presence<T> = Result<T, Absent>;

/// Trait for page objects representing a page or region of the store.
///
/// A view starts out not loaded; [`PageObject::wait_loaded`] must succeed
/// (directly or from inside a getter) before its state is read. After the
/// browser navigates away, build a fresh view instead of reusing the old one.
#[async_trait]
pub trait PageObject<D: Driver>: Sync {
    /// Page name for logging and errors
    const NAME: &'static str;

    /// Every locator the view owns
    fn locators() -> &'static [Locator]
    where
        Self: Sized;

    /// Element whose visibility means the page is ready
    fn ready_locator(&self) -> Locator;

    /// URL fragment identifying the page, if it has its own URL
    fn url_fragment(&self) -> Option<&'static str> {
        None
    }

    /// Shared context
    fn context(&self) -> &PageContext<'_, D>;

    /// Block until the defining element is visible
    ///
    /// # Errors
    ///
    /// [`ProbeError::PageNotLoaded`] wrapping the wait failure.
    async fn wait_loaded(&self) -> ProbeResult<()> {
        let ctx = self.context();
        ctx.waiter()
            .wait_for_element(&self.ready_locator(), Condition::Visible)
            .await
            .map(|_| ())
            .map_err(|e| not_loaded(Self::NAME, e))
    }

    /// Wait for the page URL (when it has one), then for readiness
    ///
    /// # Errors
    ///
    /// [`ProbeError::PageNotLoaded`] if either wait fails.
    async fn wait_arrived(&self) -> ProbeResult<()> {
        if let Some(fragment) = self.url_fragment() {
            self.context()
                .waiter()
                .wait_for_url_contains(fragment)
                .await
                .map_err(|e| not_loaded(Self::NAME, e))?;
        }
        self.wait_loaded().await
    }
}

/// Wrap a readiness failure
#[must_use]
pub fn not_loaded(page: &str, source: ProbeError) -> ProbeError {
    tracing::error!("{page} page not loaded: {source}");
    ProbeError::PageNotLoaded {
        page: page.to_string(),
        source: Box::new(source),
    }
}

/// Driver, telemetry and wait spec shared by the views of one session
pub struct PageContext<'a, D: Driver> {
    driver: &'a D,
    telemetry: &'a Telemetry,
    spec: WaitSpec,
}

impl<D: Driver> Clone for PageContext<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Driver> Copy for PageContext<'_, D> {}

impl<D: Driver> fmt::Debug for PageContext<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<'a, D: Driver> PageContext<'a, D> {
    /// Create a context with the default wait spec
    #[must_use]
    pub fn new(driver: &'a D, telemetry: &'a Telemetry) -> Self {
        Self {
            driver,
            telemetry,
            spec: WaitSpec::default(),
        }
    }

    /// Replace the wait spec
    #[must_use]
    pub const fn with_spec(mut self, spec: WaitSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Get the driver
    #[must_use]
    pub const fn driver(&self) -> &'a D {
        self.driver
    }

    /// Get the telemetry handle
    #[must_use]
    pub const fn telemetry(&self) -> &'a Telemetry {
        self.telemetry
    }

    /// Get the wait spec
    #[must_use]
    pub const fn spec(&self) -> WaitSpec {
        self.spec
    }

    /// Wait engine with this context's spec
    #[must_use]
    pub const fn waiter(&self) -> WaitEngine<'a, D> {
        WaitEngine::new(self.driver, self.telemetry, self.spec)
    }

    /// Resilient actions with the default policy
    #[must_use]
    pub fn actions(&self) -> ResilientAction<'a, D> {
        ResilientAction::new(self.waiter())
    }

    /// First match of `locator` right now, without waiting
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing or detached element.
    pub async fn find_now(&self, locator: &Locator) -> ProbeResult<Presence<D::Element>> {
        match self.driver.find_all(locator).await {
            Ok(found) => Ok(found.into_iter().next().ok_or(Absent)),
            Err(e) if e.kind.is_transient() => Ok(Err(Absent)),
            Err(e) => Err(e.into()),
        }
    }

    /// Trimmed text of the first displayed match, or [`Absent`]
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing or detached element.
    pub async fn text_now(&self, locator: &Locator) -> ProbeResult<Presence<String>> {
        let Ok(element) = self.find_now(locator).await? else {
            return Ok(Err(Absent));
        };
        self.shown_text(&element).await
    }

    /// Trimmed text of the first displayed descendant of `parent`
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing or detached element.
    pub async fn child_text(
        &self,
        parent: &D::Element,
        locator: &Locator,
    ) -> ProbeResult<Presence<String>> {
        let Ok(child) = self.child(parent, locator).await? else {
            return Ok(Err(Absent));
        };
        self.shown_text(&child).await
    }

    /// First descendant of `parent` matching `locator`
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing or detached element.
    pub async fn child(
        &self,
        parent: &D::Element,
        locator: &Locator,
    ) -> ProbeResult<Presence<D::Element>> {
        match self.driver.find_all_in(parent, locator).await {
            Ok(found) => Ok(found.into_iter().next().ok_or(Absent)),
            Err(e) if e.kind.is_transient() => Ok(Err(Absent)),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the first match is displayed right now
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing or detached element.
    pub async fn is_displayed_now(&self, locator: &Locator) -> ProbeResult<bool> {
        let Ok(element) = self.find_now(locator).await? else {
            return Ok(false);
        };
        match self.driver.is_displayed(&element).await {
            Ok(shown) => Ok(shown),
            Err(e) if e.kind.is_transient() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `locator` becomes visible within the wait spec.
    ///
    /// For elements whose absence is a valid state: no error, no screenshot.
    pub async fn appears(&self, locator: &Locator) -> bool {
        self.appears_within(locator, self.spec).await
    }

    /// [`PageContext::appears`] bounded by `spec`
    pub async fn appears_within(&self, locator: &Locator, spec: WaitSpec) -> bool {
        let driver = self.driver;
        self.waiter()
            .settle(&format!("{locator} visible"), spec, || {
                any_displayed(driver, locator)
            })
            .await
    }

    /// Cart badge count; an absent badge is an empty cart
    ///
    /// # Errors
    ///
    /// [`ProbeError::UnparsableContent`] when a badge is shown without a number.
    pub async fn badge_count(&self, locator: &Locator) -> ProbeResult<u32> {
        let grace = self.spec.capped_at(WaitSpec::short().timeout_ms);
        self.appears_within(locator, grace).await;
        match self.text_now(locator).await? {
            Err(Absent) => {
                tracing::debug!("Cart badge not shown; treating as 0");
                Ok(0)
            }
            Ok(text) => parse_count(&text).ok_or_else(|| ProbeError::UnparsableContent {
                locator: locator.to_string(),
                text,
            }),
        }
    }

    async fn shown_text(&self, element: &D::Element) -> ProbeResult<Presence<String>> {
        let shown = match self.driver.is_displayed(element).await {
            Ok(shown) => shown,
            Err(e) if e.kind == DriverErrorKind::StaleElement => return Ok(Err(Absent)),
            Err(e) => return Err(e.into()),
        };
        if !shown {
            return Ok(Err(Absent));
        }
        match self.driver.text(element).await {
            Ok(text) => Ok(Ok(text.trim().to_string())),
            Err(e) if e.kind.is_transient() => Ok(Err(Absent)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether any match of `locator` is displayed
pub(crate) async fn any_displayed<D: Driver>(driver: &D, locator: &Locator) -> DriverResult<bool> {
    for element in driver.find_all(locator).await? {
        if driver.is_displayed(&element).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

// =============================================================================
// TEXT PARSING
// =============================================================================

/// Parse a price cell such as `$29.99`
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
}

/// Parse the amount after the last `$` of a summary label such as `Total: $32.39`
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    let (_, amount) = text.rsplit_once('$')?;
    parse_price(amount)
}

/// Parse a badge or quantity count
#[must_use]
pub fn parse_count(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
