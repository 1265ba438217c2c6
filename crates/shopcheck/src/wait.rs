//! Explicit waits.
//!
//! [`WaitEngine`] polls the current document until a predicate resolves or
//! the timeout elapses. Every higher-level operation (resilient actions,
//! page readiness, getters) is built on it. A timed-out wait saves a
//! diagnostic screenshot before the error propagates.

use crate::driver::Driver;
use crate::locator::Locator;
use crate::result::{DriverErrorKind, DriverResult, ProbeError, ProbeResult};
use crate::telemetry::Telemetry;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Timeout for post-action verification (4 seconds)
pub const SHORT_WAIT_TIMEOUT_MS: u64 = 4_000;

/// Timeout for the script-level phase of a multi-strategy lookup (5 seconds)
pub const SCRIPT_LOOKUP_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// POLL / SPEC / CONDITION
// =============================================================================

/// Result of one predicate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    /// Predicate resolved with a value
    Ready(T),
    /// Not satisfied yet, poll again
    NotYet,
}

impl<T> From<Option<T>> for Poll<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotYet, Self::Ready)
    }
}

/// Timeout and poll interval of one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSpec {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitSpec {
    /// Create a spec with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec used for post-action verification
    #[must_use]
    pub const fn short() -> Self {
        Self {
            timeout_ms: SHORT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Never longer than `self`
    #[must_use]
    pub fn capped_at(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = self.timeout_ms.min(timeout_ms);
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Element state a wait can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Attached to the document
    Present,
    /// Present and displayed
    Visible,
    /// Displayed and enabled
    Clickable,
    /// At least one match, returning every match
    AllPresent,
}

impl Condition {
    /// Get the condition name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::AllPresent => "all present",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAIT ENGINE
// =============================================================================

/// Polling wait bound to one driver
pub struct WaitEngine<'a, D: Driver> {
    driver: &'a D,
    telemetry: &'a Telemetry,
    spec: WaitSpec,
}

impl<D: Driver> Clone for WaitEngine<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Driver> Copy for WaitEngine<'_, D> {}

impl<D: Driver> fmt::Debug for WaitEngine<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitEngine").field("spec", &self.spec).finish()
    }
}

impl<'a, D: Driver> WaitEngine<'a, D> {
    /// Create a wait engine
    #[must_use]
    pub const fn new(driver: &'a D, telemetry: &'a Telemetry, spec: WaitSpec) -> Self {
        Self {
            driver,
            telemetry,
            spec,
        }
    }

    /// Same engine with a different spec
    #[must_use]
    pub const fn with_spec(self, spec: WaitSpec) -> Self {
        Self { spec, ..self }
    }

    /// Current spec
    #[must_use]
    pub const fn spec(&self) -> WaitSpec {
        self.spec
    }

    /// Driver the engine polls
    #[must_use]
    pub const fn driver(&self) -> &'a D {
        self.driver
    }

    /// Telemetry used for timeout screenshots
    #[must_use]
    pub const fn telemetry(&self) -> &'a Telemetry {
        self.telemetry
    }

    /// Poll `predicate` until it resolves.
    ///
    /// Stale-element and no-such-element failures count as "not yet"; a lost
    /// session aborts immediately.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ConditionNotMet`] on timeout, or the driver error that
    /// aborted the wait.
    pub async fn wait_for<T, F, Fut>(&self, description: &str, predicate: F) -> ProbeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<Poll<T>>>,
    {
        match poll_until(self.spec, predicate).await? {
            Some(value) => Ok(value),
            None => {
                self.on_timeout("condition_not_met", description).await;
                Err(ProbeError::ConditionNotMet {
                    description: description.to_string(),
                    timeout_ms: self.spec.timeout_ms,
                })
            }
        }
    }

    /// Wait until the first element matching `locator` satisfies `condition`
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] on timeout.
    pub async fn wait_for_element(
        &self,
        locator: &Locator,
        condition: Condition,
    ) -> ProbeResult<D::Element> {
        let mut all = self.element_poll(locator, condition).await?;
        Ok(all.swap_remove(0))
    }

    /// Wait until at least one element matches and return every match
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] on timeout.
    pub async fn wait_for_all(&self, locator: &Locator) -> ProbeResult<Vec<D::Element>> {
        self.element_poll(locator, Condition::AllPresent).await
    }

    /// Wait until the current URL contains `fragment`
    ///
    /// # Errors
    ///
    /// [`ProbeError::ConditionNotMet`] on timeout.
    pub async fn wait_for_url_contains(&self, fragment: &str) -> ProbeResult<String> {
        let driver = self.driver;
        self.wait_for(&format!("url contains {fragment:?}"), || {
            url_containing(driver, fragment)
        })
        .await
    }

    /// Multi-strategy lookup.
    ///
    /// Polls a script-level query of every candidate (bounded by
    /// [`SCRIPT_LOOKUP_TIMEOUT_MS`]), then falls back to native presence of
    /// every candidate. The first hit wins.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] naming every candidate.
    pub async fn first_of(&self, candidates: &[Locator]) -> ProbeResult<D::Element> {
        let driver = self.driver;
        let script_spec = self.spec.capped_at(SCRIPT_LOOKUP_TIMEOUT_MS);
        let by_script = poll_until(script_spec, || script_lookup(driver, candidates)).await?;
        if let Some(element) = by_script {
            return Ok(element);
        }

        tracing::info!("Script lookup found nothing; trying native presence of each candidate");
        let native = poll_until(self.spec, || native_lookup(driver, candidates)).await?;

        match native {
            Some(element) => Ok(element),
            None => {
                let joined = candidates
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" | ");
                self.on_timeout("element_not_found", &joined).await;
                Err(ProbeError::ElementNotFound {
                    locator: joined,
                    condition: Condition::Present.to_string(),
                    timeout_ms: self.spec.timeout_ms,
                })
            }
        }
    }

    /// Bounded poll that never fails.
    ///
    /// Returns whether the predicate turned true within `spec`. No screenshot
    /// is taken and every driver error reads as "not yet".
    pub async fn settle<F, Fut>(&self, description: &str, spec: WaitSpec, mut predicate: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<bool>>,
    {
        let outcome = poll_until(spec, || {
            let fut = predicate();
            async move {
                match fut.await {
                    Ok(true) => Ok(Poll::Ready(())),
                    Err(e) if e.kind == DriverErrorKind::SessionLost => Err(e),
                    Ok(false) | Err(_) => Ok(Poll::NotYet),
                }
            }
        })
        .await;
        let settled = matches!(outcome, Ok(Some(())));
        if !settled {
            tracing::debug!("{description} did not settle within {}ms", spec.timeout_ms);
        }
        settled
    }

    async fn element_poll(
        &self,
        locator: &Locator,
        condition: Condition,
    ) -> ProbeResult<Vec<D::Element>> {
        let driver = self.driver;
        let found = poll_until(self.spec, || check_condition(driver, locator, condition)).await?;
        match found {
            Some(elements) => Ok(elements),
            None => {
                self.on_timeout("element_not_found", &format!("{locator} ({condition})"))
                    .await;
                Err(ProbeError::ElementNotFound {
                    locator: locator.to_string(),
                    condition: condition.to_string(),
                    timeout_ms: self.spec.timeout_ms,
                })
            }
        }
    }

    async fn on_timeout(&self, shot_name: &str, what: &str) {
        tracing::error!("Timed out after {}ms waiting for {what}", self.spec.timeout_ms);
        let _ = self.telemetry.capture_screenshot(self.driver, shot_name).await;
    }
}

async fn url_containing<D: Driver>(driver: &D, fragment: &str) -> DriverResult<Poll<String>> {
    let url = driver.current_url().await?;
    Ok(if url.contains(fragment) {
        Poll::Ready(url)
    } else {
        Poll::NotYet
    })
}

async fn script_lookup<D: Driver>(
    driver: &D,
    candidates: &[Locator],
) -> DriverResult<Poll<D::Element>> {
    for locator in candidates {
        match driver.query_by_script(locator).await {
            Ok(Some(element)) => return Ok(Poll::Ready(element)),
            Err(e) if e.kind == DriverErrorKind::SessionLost => return Err(e),
            Ok(None) | Err(_) => {}
        }
    }
    Ok(Poll::NotYet)
}

async fn native_lookup<D: Driver>(
    driver: &D,
    candidates: &[Locator],
) -> DriverResult<Poll<D::Element>> {
    for locator in candidates {
        if let Some(element) = driver.find_all(locator).await?.into_iter().next() {
            return Ok(Poll::Ready(element));
        }
    }
    Ok(Poll::NotYet)
}

/// Evaluate `condition` for `locator` once
async fn check_condition<D: Driver>(
    driver: &D,
    locator: &Locator,
    condition: Condition,
) -> DriverResult<Poll<Vec<D::Element>>> {
    let matches = driver.find_all(locator).await?;
    if matches.is_empty() {
        return Ok(Poll::NotYet);
    }
    match condition {
        Condition::Present | Condition::AllPresent => Ok(Poll::Ready(matches)),
        Condition::Visible | Condition::Clickable => {
            for element in matches {
                if !driver.is_displayed(&element).await? {
                    continue;
                }
                if condition == Condition::Clickable && !driver.is_enabled(&element).await? {
                    continue;
                }
                return Ok(Poll::Ready(vec![element]));
            }
            Ok(Poll::NotYet)
        }
    }
}

/// Core poll loop. `Ok(None)` means the timeout elapsed.
///
/// Sleeps never overshoot the deadline, so the call returns within
/// `timeout + one poll interval`.
async fn poll_until<T, F, Fut>(spec: WaitSpec, mut predicate: F) -> DriverResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<Poll<T>>>,
{
    let start = Instant::now();
    let timeout = spec.timeout();
    loop {
        match predicate().await {
            Ok(Poll::Ready(value)) => return Ok(Some(value)),
            Ok(Poll::NotYet) => {}
            Err(e) if e.kind.is_transient() => {
                tracing::trace!("Transient failure while polling: {e}");
            }
            Err(e) => return Err(e),
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(None);
        }
        tokio::time::sleep(spec.poll_interval().min(timeout - elapsed)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockNode};
    use crate::result::DriverError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TARGET: Locator = Locator::css(".target");
    const OTHER: Locator = Locator::css(".other");

    fn fast() -> WaitSpec {
        WaitSpec::new().with_timeout(200).with_poll_interval(10)
    }

    mod spec_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let spec = WaitSpec::default();
            assert_eq!(spec.timeout(), Duration::from_secs(10));
            assert_eq!(spec.poll_interval(), Duration::from_millis(250));
            assert_eq!(WaitSpec::short().timeout_ms, 4_000);
        }

        #[test]
        fn test_capped_at() {
            assert_eq!(WaitSpec::new().capped_at(5_000).timeout_ms, 5_000);
            assert_eq!(fast().capped_at(5_000).timeout_ms, 200);
        }

        #[test]
        fn test_poll_from_option() {
            assert_eq!(Poll::from(Some(3)), Poll::Ready(3));
            assert_eq!(Poll::<u8>::from(None), Poll::NotYet);
        }
    }

    mod element_tests {
        use super::*;

        #[tokio::test]
        async fn test_element_appearing_later_is_found() {
            let driver = MockDriver::new();
            driver.add(MockNode::new("div").matching(TARGET).absent_for_polls(3));
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let element = engine.wait_for_element(&TARGET, Condition::Present).await;
            assert!(element.is_ok());
            assert!(driver.call_count("find_all") >= 4);
        }

        #[tokio::test]
        async fn test_timeout_captures_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let driver = MockDriver::new();
            let telemetry = Telemetry::new(dir.path());
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let err = engine
                .wait_for_element(&TARGET, Condition::Visible)
                .await
                .unwrap_err();

            match err {
                ProbeError::ElementNotFound {
                    locator,
                    condition,
                    timeout_ms,
                } => {
                    assert_eq!(locator, "css=.target");
                    assert_eq!(condition, "visible");
                    assert_eq!(timeout_ms, 200);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(driver.screenshot_count(), 1);
        }

        #[tokio::test]
        async fn test_visible_skips_hidden_match() {
            let driver = MockDriver::new();
            driver.add(MockNode::new("div").matching(TARGET).hidden());
            let shown = driver.add(MockNode::new("div").matching(TARGET).with_text("shown"));
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let element = engine
                .wait_for_element(&TARGET, Condition::Visible)
                .await
                .unwrap();
            assert_eq!(element, shown);
        }

        #[tokio::test]
        async fn test_clickable_requires_enabled() {
            let driver = MockDriver::new();
            driver.add(MockNode::new("button").matching(TARGET).disabled());
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            assert!(engine
                .wait_for_element(&TARGET, Condition::Clickable)
                .await
                .is_err());
            assert!(engine
                .wait_for_element(&TARGET, Condition::Present)
                .await
                .is_ok());
        }

        #[tokio::test]
        async fn test_wait_for_all_returns_every_match() {
            let driver = MockDriver::new();
            for _ in 0..3 {
                driver.add(MockNode::new("li").matching(TARGET));
            }
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());
            assert_eq!(engine.wait_for_all(&TARGET).await.unwrap().len(), 3);
        }
    }

    mod predicate_tests {
        use super::*;

        #[tokio::test]
        async fn test_returns_first_success() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());
            let calls = AtomicUsize::new(0);

            let value = engine
                .wait_for("counter reaches 2", || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, DriverError>(if n >= 2 { Poll::Ready(n) } else { Poll::NotYet }) }
                })
                .await
                .unwrap();
            assert_eq!(value, 2);
        }

        #[tokio::test]
        async fn test_stale_counts_as_not_yet() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());
            let calls = AtomicUsize::new(0);

            let value = engine
                .wait_for("recovers from stale", || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(DriverError::new(DriverErrorKind::StaleElement, "detached"))
                        } else {
                            Ok(Poll::Ready("ok"))
                        }
                    }
                })
                .await
                .unwrap();
            assert_eq!(value, "ok");
        }

        #[tokio::test]
        async fn test_session_lost_aborts_immediately() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(
                &driver,
                &telemetry,
                WaitSpec::new().with_timeout(5_000).with_poll_interval(10),
            );
            let start = Instant::now();

            let err = engine
                .wait_for("never", || async {
                    Err::<Poll<()>, _>(DriverError::new(DriverErrorKind::SessionLost, "gone"))
                })
                .await
                .unwrap_err();
            assert!(err.is_infrastructure());
            assert!(start.elapsed() < Duration::from_secs(1));
        }

        #[tokio::test]
        async fn test_timeout_is_bounded() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let spec = WaitSpec::new().with_timeout(120).with_poll_interval(50);
            let engine = WaitEngine::new(&driver, &telemetry, spec);
            let start = Instant::now();

            let err = engine
                .wait_for("never", || async { Ok::<_, DriverError>(Poll::<()>::NotYet) })
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::ConditionNotMet { .. }));
            // one poll interval plus scheduling slack
            assert!(start.elapsed() < Duration::from_millis(120 + 50 + 150));
        }

        #[tokio::test]
        async fn test_url_contains() {
            let driver = MockDriver::new();
            driver.set_location("https://shop.test/inventory.html", "Swag Labs");
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());
            let url = engine.wait_for_url_contains("inventory.html").await.unwrap();
            assert!(url.ends_with("inventory.html"));
            assert!(engine.wait_for_url_contains("cart.html").await.is_err());
        }
    }

    mod lookup_tests {
        use super::*;

        #[tokio::test]
        async fn test_first_of_prefers_script_query() {
            let driver = MockDriver::new();
            let el = driver.add(MockNode::new("select").matching(OTHER));
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let found = engine.first_of(&[TARGET, OTHER]).await.unwrap();
            assert_eq!(found, el);
            assert!(driver.was_called("query_by_script"));
            assert!(!driver.was_called("find_all"));
        }

        #[tokio::test]
        async fn test_first_of_falls_back_to_native() {
            let driver = MockDriver::new();
            driver.set_script_queries(false);
            let el = driver.add(MockNode::new("select").matching(OTHER));
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let found = engine.first_of(&[TARGET, OTHER]).await.unwrap();
            assert_eq!(found, el);
            assert!(driver.was_called("find_all"));
        }

        #[tokio::test]
        async fn test_first_of_reports_every_candidate() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let err = engine.first_of(&[TARGET, OTHER]).await.unwrap_err();
            assert!(err.to_string().contains("css=.target | css=.other"));
        }
    }

    mod settle_tests {
        use super::*;

        #[tokio::test]
        async fn test_settle_false_without_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let driver = MockDriver::new();
            let telemetry = Telemetry::new(dir.path());
            let engine = WaitEngine::new(&driver, &telemetry, fast());

            let settled = engine
                .settle("nothing changes", fast(), || async { Ok::<_, DriverError>(false) })
                .await;
            assert!(!settled);
            assert_eq!(driver.screenshot_count(), 0);
        }

        #[tokio::test]
        async fn test_settle_tolerates_errors() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());
            let calls = AtomicUsize::new(0);

            let settled = engine
                .settle("script error then true", fast(), || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(DriverError::new(DriverErrorKind::Script, "boom"))
                        } else {
                            Ok(true)
                        }
                    }
                })
                .await;
            assert!(settled);
        }
    }
}
