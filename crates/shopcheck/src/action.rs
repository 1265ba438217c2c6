//! Resilient interactions.
//!
//! A [`ResilientAction`] resolves its target through the [`WaitEngine`] and
//! then walks an ordered [`ActionPolicy`]. The native WebDriver call is always
//! tried first; scrolling and script-forced interaction are used only after an
//! observed, recoverable failure.

use crate::driver::{scripts, Driver};
use crate::locator::Locator;
use crate::result::{DriverError, DriverErrorKind, DriverResult, ProbeError, ProbeResult};
use crate::wait::{Condition, WaitEngine, WaitSpec};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// One way of performing an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptStrategy {
    /// Plain WebDriver call
    Native,
    /// Scroll the element to the viewport centre, then the WebDriver call
    ScrollThenNative,
    /// Script-forced interaction that skips interactability checks
    Script,
}

/// Ordered attempt strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPolicy {
    attempts: Vec<AttemptStrategy>,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            attempts: vec![
                AttemptStrategy::Native,
                AttemptStrategy::ScrollThenNative,
                AttemptStrategy::Script,
            ],
        }
    }
}

impl ActionPolicy {
    /// Policy with an explicit attempt order
    #[must_use]
    pub fn new(attempts: Vec<AttemptStrategy>) -> Self {
        Self { attempts }
    }

    /// Native interaction only, for controls where a forced script would be wrong
    #[must_use]
    pub fn native_only() -> Self {
        Self {
            attempts: vec![AttemptStrategy::Native],
        }
    }

    /// Attempts in order
    #[must_use]
    pub fn attempts(&self) -> &[AttemptStrategy] {
        &self.attempts
    }
}

/// Logical interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Click
    Click,
    /// Replace an input's value
    SetValue(String),
    /// Choose a `<select>` option by value
    SelectOption(String),
}

impl Action {
    /// Action name used in logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::SetValue(_) => "set_value",
            Self::SelectOption(_) => "select_option",
        }
    }

    /// Whether a failure of this kind is worth the next attempt
    #[must_use]
    pub const fn recovers_from(&self, kind: DriverErrorKind) -> bool {
        match self {
            Self::Click | Self::SetValue(_) => matches!(
                kind,
                DriverErrorKind::NotInteractable
                    | DriverErrorKind::ClickIntercepted
                    | DriverErrorKind::StaleElement
            ),
            Self::SelectOption(_) => !matches!(kind, DriverErrorKind::SessionLost),
        }
    }
}

/// What happened to one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// First attempt succeeded
    Success,
    /// Target never appeared
    TimedOut(Locator),
    /// A later attempt succeeded after the native call failed
    InterceptedFallbackUsed,
    /// Every attempt failed; the last cause
    Failed(String),
}

impl InteractionOutcome {
    /// Whether the action took effect
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::InterceptedFallbackUsed)
    }

    /// Convert failure outcomes into errors
    ///
    /// # Errors
    ///
    /// `TimedOut` becomes [`ProbeError::ElementNotFound`] and `Failed`
    /// becomes [`ProbeError::InteractionFallbackExhausted`].
    pub fn into_result(self, action: &Action, locator: &Locator, timeout_ms: u64) -> ProbeResult<Self> {
        match self {
            Self::TimedOut(target) => Err(ProbeError::ElementNotFound {
                locator: target.to_string(),
                condition: Condition::Present.to_string(),
                timeout_ms,
            }),
            Self::Failed(cause) => Err(ProbeError::InteractionFallbackExhausted {
                action: action.name().to_string(),
                locator: locator.to_string(),
                cause,
            }),
            ok => Ok(ok),
        }
    }
}

impl fmt::Display for InteractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::TimedOut(locator) => write!(f, "timed out waiting for {locator}"),
            Self::InterceptedFallbackUsed => f.write_str("success via fallback"),
            Self::Failed(cause) => write!(f, "failed: {cause}"),
        }
    }
}

/// Wait-then-interact with fallbacks
pub struct ResilientAction<'a, D: Driver> {
    engine: WaitEngine<'a, D>,
    policy: ActionPolicy,
}

impl<D: Driver> fmt::Debug for ResilientAction<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientAction")
            .field("engine", &self.engine)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<'a, D: Driver> ResilientAction<'a, D> {
    /// Create with the default policy
    #[must_use]
    pub fn new(engine: WaitEngine<'a, D>) -> Self {
        Self {
            engine,
            policy: ActionPolicy::default(),
        }
    }

    /// Replace the policy
    #[must_use]
    pub fn with_policy(mut self, policy: ActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Click the element matching `locator`
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if it never appears,
    /// [`ProbeError::InteractionFallbackExhausted`] if every attempt fails.
    pub async fn click(&self, locator: &Locator) -> ProbeResult<InteractionOutcome> {
        self.checked(locator, Action::Click).await
    }

    /// Replace the value of the input matching `locator`
    ///
    /// # Errors
    ///
    /// Same as [`ResilientAction::click`].
    pub async fn set_value(&self, locator: &Locator, text: &str) -> ProbeResult<InteractionOutcome> {
        self.checked(locator, Action::SetValue(text.to_string())).await
    }

    /// Choose an option of the `<select>` matching `locator`
    ///
    /// # Errors
    ///
    /// Same as [`ResilientAction::click`].
    pub async fn select_option(
        &self,
        locator: &Locator,
        value: &str,
    ) -> ProbeResult<InteractionOutcome> {
        self.checked(locator, Action::SelectOption(value.to_string()))
            .await
    }

    /// Visible text of the element matching `locator`, trimmed.
    ///
    /// Falls back to the raw `textContent` when the rendered text is empty.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotFound`] if it never becomes visible.
    pub async fn read_text(&self, locator: &Locator) -> ProbeResult<String> {
        let driver = self.engine.driver();
        let element = self.engine.wait_for_element(locator, Condition::Visible).await?;
        let text = driver.text(&element).await?;
        if !text.trim().is_empty() {
            return Ok(text.trim().to_string());
        }
        match driver
            .execute_on(scripts::TEXT_CONTENT, &element, Vec::new())
            .await
        {
            Ok(Value::String(raw)) => Ok(raw.trim().to_string()),
            _ => Ok(String::new()),
        }
    }

    /// Resolve `locator` and perform `action`, returning the raw outcome
    ///
    /// # Errors
    ///
    /// Only driver faults that no attempt can recover from.
    pub async fn perform(&self, locator: &Locator, action: &Action) -> ProbeResult<InteractionOutcome> {
        let element = match self.engine.wait_for_element(locator, Condition::Present).await {
            Ok(element) => element,
            Err(ProbeError::ElementNotFound { .. }) => {
                return Ok(InteractionOutcome::TimedOut(locator.clone()))
            }
            Err(e) => return Err(e),
        };
        self.await_clickable(locator).await;
        self.attempt_all(element, Some(locator), locator, action)
            .await
    }

    /// Perform `action` on an already resolved element.
    ///
    /// `label` only names the element in logs and errors; stale handles cannot
    /// be re-resolved, so staleness ends the attempt chain.
    ///
    /// # Errors
    ///
    /// [`ProbeError::InteractionFallbackExhausted`] if every attempt fails.
    pub async fn perform_on(
        &self,
        element: D::Element,
        label: &Locator,
        action: &Action,
    ) -> ProbeResult<InteractionOutcome> {
        self.attempt_all(element, None, label, action)
            .await?
            .into_result(action, label, self.engine.spec().timeout_ms)
    }

    /// Bounded post-action verification.
    ///
    /// Polls `probe` for a value different from `before`; returns `false`
    /// when nothing changed within the short bound. Never fails.
    pub async fn expect_change<T, F, Fut>(&self, description: &str, before: &T, mut probe: F) -> bool
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        let spec = self.verify_spec();
        let changed = self
            .engine
            .settle(description, spec, || {
                let fut = probe();
                async move { fut.await.map(|now| now != *before) }
            })
            .await;
        if changed {
            tracing::info!("{description}: change observed");
        } else {
            tracing::info!("{description}: no visible change within {}ms, continuing", spec.timeout_ms);
        }
        changed
    }

    async fn checked(&self, locator: &Locator, action: Action) -> ProbeResult<InteractionOutcome> {
        tracing::info!("{} {locator}", action.name());
        self.perform(locator, &action)
            .await?
            .into_result(&action, locator, self.engine.spec().timeout_ms)
    }

    fn verify_spec(&self) -> WaitSpec {
        let spec = self.engine.spec();
        WaitSpec::short()
            .capped_at(spec.timeout_ms)
            .with_poll_interval(spec.poll_interval_ms)
    }

    async fn await_clickable(&self, locator: &Locator) {
        let driver = self.engine.driver();
        let reported = self
            .engine
            .settle("clickable", self.verify_spec(), || async move {
                for element in driver.find_all(locator).await? {
                    if driver.is_displayed(&element).await? && driver.is_enabled(&element).await? {
                        return Ok(true);
                    }
                }
                Ok::<_, DriverError>(false)
            })
            .await;
        if !reported {
            tracing::info!("{locator} not reported clickable; proceeding anyway");
        }
    }

    async fn attempt_all(
        &self,
        mut element: D::Element,
        resolvable: Option<&Locator>,
        label: &Locator,
        action: &Action,
    ) -> ProbeResult<InteractionOutcome> {
        let mut last_cause: Option<DriverError> = None;
        for (index, strategy) in self.policy.attempts().iter().enumerate() {
            match self.attempt(*strategy, &element, action).await {
                Ok(()) if index == 0 => return Ok(InteractionOutcome::Success),
                Ok(()) => {
                    tracing::info!("{} on {label} succeeded via {strategy:?}", action.name());
                    return Ok(InteractionOutcome::InterceptedFallbackUsed);
                }
                Err(e) if !action.recovers_from(e.kind) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("{} on {label} failed via {strategy:?}: {e}", action.name());
                    if e.kind == DriverErrorKind::StaleElement {
                        let Some(locator) = resolvable else {
                            return Ok(InteractionOutcome::Failed(e.to_string()));
                        };
                        element = match self.engine.wait_for_element(locator, Condition::Present).await {
                            Ok(fresh) => fresh,
                            Err(ProbeError::ElementNotFound { .. }) => {
                                return Ok(InteractionOutcome::TimedOut(locator.clone()))
                            }
                            Err(other) => return Err(other),
                        };
                    }
                    last_cause = Some(e);
                }
            }
        }
        Ok(InteractionOutcome::Failed(last_cause.map_or_else(
            || "no attempt strategies configured".to_string(),
            |e| e.to_string(),
        )))
    }

    async fn attempt(
        &self,
        strategy: AttemptStrategy,
        element: &D::Element,
        action: &Action,
    ) -> DriverResult<()> {
        let driver = self.engine.driver();
        match strategy {
            AttemptStrategy::Native => native(driver, element, action).await,
            AttemptStrategy::ScrollThenNative => {
                if let Err(e) = driver
                    .execute_on(scripts::SCROLL_INTO_VIEW, element, Vec::new())
                    .await
                {
                    tracing::debug!("scroll into view failed: {e}");
                }
                native(driver, element, action).await
            }
            AttemptStrategy::Script => scripted(driver, element, action).await,
        }
    }
}

async fn native<D: Driver>(driver: &D, element: &D::Element, action: &Action) -> DriverResult<()> {
    match action {
        Action::Click => driver.click(element).await,
        Action::SetValue(text) => {
            driver.clear(element).await?;
            driver.send_keys(element, text).await
        }
        Action::SelectOption(value) => driver.select_by_value(element, value).await,
    }
}

async fn scripted<D: Driver>(driver: &D, element: &D::Element, action: &Action) -> DriverResult<()> {
    let (script, args) = match action {
        Action::Click => (scripts::CLICK, Vec::new()),
        Action::SetValue(text) => (
            scripts::SET_VALUE_AND_INPUT,
            vec![Value::String(text.clone())],
        ),
        Action::SelectOption(value) => (
            scripts::SET_VALUE_AND_CHANGE,
            vec![Value::String(value.clone())],
        ),
    };
    driver.execute_on(script, element, args).await.map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockNode};
    use crate::telemetry::Telemetry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BUTTON: Locator = Locator::id("finish");
    const SORT: Locator = Locator::css("select.sort");

    fn fast() -> WaitSpec {
        WaitSpec::new().with_timeout(200).with_poll_interval(10)
    }

    fn counting(driver: &MockDriver, node: MockNode) -> Arc<AtomicUsize> {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        driver.add(node.on_click(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        clicks
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_default_order() {
            assert_eq!(
                ActionPolicy::default().attempts(),
                &[
                    AttemptStrategy::Native,
                    AttemptStrategy::ScrollThenNative,
                    AttemptStrategy::Script
                ]
            );
            assert_eq!(ActionPolicy::native_only().attempts(), &[AttemptStrategy::Native]);
            assert_eq!(
                ActionPolicy::new(vec![AttemptStrategy::Script]).attempts(),
                &[AttemptStrategy::Script]
            );
        }

        #[test]
        fn test_recoverable_kinds() {
            assert!(Action::Click.recovers_from(DriverErrorKind::ClickIntercepted));
            assert!(Action::Click.recovers_from(DriverErrorKind::StaleElement));
            assert!(!Action::Click.recovers_from(DriverErrorKind::Script));
            let select = Action::SelectOption("az".into());
            assert!(select.recovers_from(DriverErrorKind::Other));
            assert!(!select.recovers_from(DriverErrorKind::SessionLost));
        }

        #[test]
        fn test_outcome_conversion() {
            let failed = InteractionOutcome::Failed("blocked".into())
                .into_result(&Action::Click, &BUTTON, 100)
                .unwrap_err();
            assert!(matches!(failed, ProbeError::InteractionFallbackExhausted { .. }));

            let timed_out = InteractionOutcome::TimedOut(BUTTON)
                .into_result(&Action::Click, &BUTTON, 100)
                .unwrap_err();
            assert!(matches!(timed_out, ProbeError::ElementNotFound { .. }));

            assert!(InteractionOutcome::Success
                .into_result(&Action::Click, &BUTTON, 100)
                .is_ok());
        }
    }

    mod click_tests {
        use super::*;

        #[tokio::test]
        async fn test_native_click_first() {
            let driver = MockDriver::new();
            let clicks = counting(&driver, MockNode::new("button").matching(BUTTON));
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let outcome = action.click(&BUTTON).await.unwrap();
            assert_eq!(outcome, InteractionOutcome::Success);
            assert_eq!(clicks.load(Ordering::SeqCst), 1);
            assert!(!driver.was_called("execute_on"));
        }

        #[tokio::test]
        async fn test_scroll_recovers_interception() {
            let driver = MockDriver::new();
            let clicks = counting(
                &driver,
                MockNode::new("button")
                    .matching(BUTTON)
                    .failing_clicks(&[DriverErrorKind::ClickIntercepted]),
            );
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let outcome = action.click(&BUTTON).await.unwrap();
            assert_eq!(outcome, InteractionOutcome::InterceptedFallbackUsed);
            assert_eq!(clicks.load(Ordering::SeqCst), 1);
            assert!(driver.was_called("execute_on:scroll_into_view"));
            assert!(!driver.was_called("execute_on:click"));
        }

        #[tokio::test]
        async fn test_script_click_after_two_failures() {
            let driver = MockDriver::new();
            let clicks = counting(
                &driver,
                MockNode::new("button").matching(BUTTON).failing_clicks(&[
                    DriverErrorKind::ClickIntercepted,
                    DriverErrorKind::NotInteractable,
                ]),
            );
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let outcome = action.click(&BUTTON).await.unwrap();
            assert_eq!(outcome, InteractionOutcome::InterceptedFallbackUsed);
            assert_eq!(clicks.load(Ordering::SeqCst), 1);
            assert!(driver.was_called("execute_on:click"));
        }

        #[tokio::test]
        async fn test_hidden_element_uses_script_click() {
            let driver = MockDriver::new();
            let clicks = counting(&driver, MockNode::new("a").matching(BUTTON).hidden());
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            assert!(action.click(&BUTTON).await.unwrap().is_success());
            assert_eq!(clicks.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_native_only_exhausts() {
            let driver = MockDriver::new();
            counting(
                &driver,
                MockNode::new("button")
                    .matching(BUTTON)
                    .failing_clicks(&[DriverErrorKind::ClickIntercepted]),
            );
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()))
                .with_policy(ActionPolicy::native_only());

            let err = action.click(&BUTTON).await.unwrap_err();
            match err {
                ProbeError::InteractionFallbackExhausted { action, cause, .. } => {
                    assert_eq!(action, "click");
                    assert!(cause.contains("intercepted"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_missing_target_times_out() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let outcome = action.perform(&BUTTON, &Action::Click).await.unwrap();
            assert_eq!(outcome, InteractionOutcome::TimedOut(BUTTON));
            assert!(matches!(
                action.click(&BUTTON).await.unwrap_err(),
                ProbeError::ElementNotFound { .. }
            ));
        }

        #[tokio::test]
        async fn test_stale_handle_is_re_resolved() {
            let driver = MockDriver::new();
            let clicks = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&clicks);
            let first = driver.add(MockNode::new("button").matching(BUTTON).failing_clicks(&[
                DriverErrorKind::StaleElement,
            ]));
            let telemetry = Telemetry::disabled();
            let engine = WaitEngine::new(&driver, &telemetry, fast());
            let action = ResilientAction::new(engine);

            let resolved = engine.wait_for_element(&BUTTON, Condition::Present).await.unwrap();
            assert_eq!(resolved, first);
            driver.remove(first);
            driver.add(MockNode::new("button").matching(BUTTON).on_click(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

            let outcome = action
                .attempt_all(resolved, Some(&BUTTON), &BUTTON, &Action::Click)
                .await
                .unwrap();
            assert!(outcome.is_success());
            assert_eq!(clicks.load(Ordering::SeqCst), 1);
        }
    }

    mod select_tests {
        use super::*;

        #[tokio::test]
        async fn test_native_select() {
            let driver = MockDriver::new();
            let select = driver.add(
                MockNode::new("select")
                    .matching(SORT)
                    .with_options(&["az", "za"])
                    .with_value("az"),
            );
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let outcome = action.select_option(&SORT, "za").await.unwrap();
            assert_eq!(outcome, InteractionOutcome::Success);
            assert_eq!(driver.value_of(select).as_deref(), Some("za"));
        }

        #[tokio::test]
        async fn test_script_fallback_sets_value_and_fires_change() {
            let driver = MockDriver::new();
            driver.fail_native_select(true);
            let changes = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&changes);
            let select = driver.add(
                MockNode::new("select")
                    .matching(SORT)
                    .with_options(&["az", "za"])
                    .with_value("az")
                    .on_change(move |_, _| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
            );
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let outcome = action.select_option(&SORT, "za").await.unwrap();
            assert_eq!(outcome, InteractionOutcome::InterceptedFallbackUsed);
            assert_eq!(driver.value_of(select).as_deref(), Some("za"));
            assert_eq!(changes.load(Ordering::SeqCst), 1);
            assert!(driver.was_called("execute_on:set_value_and_change"));
        }
    }

    mod input_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_value_replaces_text() {
            const INPUT: Locator = Locator::id("first-name");
            let driver = MockDriver::new();
            let input = driver.add(MockNode::new("input").matching(INPUT).with_value("old"));
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            action.set_value(&INPUT, "Amisha").await.unwrap();
            assert_eq!(driver.value_of(input).as_deref(), Some("Amisha"));
        }

        #[tokio::test]
        async fn test_read_text_trims_and_falls_back() {
            const LABEL: Locator = Locator::css(".label");
            const EMPTY: Locator = Locator::css(".empty");
            let driver = MockDriver::new();
            driver.add(MockNode::new("div").matching(LABEL).with_text("  Total: $32.39 "));
            driver.add(
                MockNode::new("div")
                    .matching(EMPTY)
                    .with_attr("textContent", " hidden text "),
            );
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            assert_eq!(action.read_text(&LABEL).await.unwrap(), "Total: $32.39");
            assert_eq!(action.read_text(&EMPTY).await.unwrap(), "hidden text");
        }
    }

    mod verify_tests {
        use super::*;

        #[tokio::test]
        async fn test_expect_change_observes_new_value() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));
            let reads = AtomicUsize::new(0);

            let changed = action
                .expect_change("counter", &0usize, || {
                    let n = reads.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, DriverError>(n.min(2)) }
                })
                .await;
            assert!(changed);
        }

        #[tokio::test]
        async fn test_expect_change_tolerates_no_change() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let action = ResilientAction::new(WaitEngine::new(&driver, &telemetry, fast()));

            let changed = action
                .expect_change("static list", &vec!["a"], || async {
                    Ok::<_, DriverError>(vec!["a"])
                })
                .await;
            assert!(!changed);
        }
    }
}
