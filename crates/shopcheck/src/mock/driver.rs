//! In-memory [`Driver`] for unit testing.
//!
//! The document is an arena of [`MockNode`]s. Nodes match the exact
//! [`Locator`] values they were tagged with, can appear late, can fail native
//! clicks with a queued error kind, and can run handlers on click or change.
//! Every driver call is recorded for verification.

use crate::driver::{scripts, Driver};
use crate::locator::Locator;
use crate::result::{DriverError, DriverErrorKind, DriverResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback run on click (value `""`), on change (the new value) or on navigation (the URL)
pub type MockHandler = Arc<dyn Fn(&MockDriver, &str) + Send + Sync>;

/// 1x1 transparent PNG returned by screenshots
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Handle to a mock node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockElement(usize);

/// One node of the mock document
pub struct MockNode {
    /// Tag name
    pub tag: String,
    /// Locators this node answers to
    pub locators: Vec<Locator>,
    /// Rendered text
    pub text: String,
    /// Displayed flag
    pub displayed: bool,
    /// Enabled flag
    pub enabled: bool,
    /// Form control value
    pub value: Option<String>,
    /// Allowed `<select>` option values
    pub options: Vec<String>,
    /// Attributes
    pub attrs: HashMap<String, String>,
    click_failures: VecDeque<DriverErrorKind>,
    absent_polls: u32,
    on_click: Option<MockHandler>,
    on_change: Option<MockHandler>,
    parent: Option<usize>,
    removed: bool,
}

impl fmt::Debug for MockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockNode")
            .field("tag", &self.tag)
            .field("locators", &self.locators)
            .field("text", &self.text)
            .field("displayed", &self.displayed)
            .field("enabled", &self.enabled)
            .field("value", &self.value)
            .field("removed", &self.removed)
            .finish_non_exhaustive()
    }
}

impl MockNode {
    /// Create a displayed, enabled node
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            locators: Vec::new(),
            text: String::new(),
            displayed: true,
            enabled: true,
            value: None,
            options: Vec::new(),
            attrs: HashMap::new(),
            click_failures: VecDeque::new(),
            absent_polls: 0,
            on_click: None,
            on_change: None,
            parent: None,
            removed: false,
        }
    }

    /// Answer to `locator`
    #[must_use]
    pub fn matching(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        self
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Not enabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the control value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set `<select>` option values
    #[must_use]
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(ToString::to_string).collect();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attrs.insert(name.into(), value.into());
        self
    }

    /// Skip this node in the next `polls` lookups
    #[must_use]
    pub const fn absent_for_polls(mut self, polls: u32) -> Self {
        self.absent_polls = polls;
        self
    }

    /// Fail the next native clicks with these kinds, in order
    #[must_use]
    pub fn failing_clicks(mut self, kinds: &[DriverErrorKind]) -> Self {
        self.click_failures.extend(kinds.iter().copied());
        self
    }

    /// Run `handler` when clicked
    #[must_use]
    pub fn on_click(mut self, handler: impl Fn(&MockDriver, &str) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(handler));
        self
    }

    /// Run `handler` with the new value when changed
    #[must_use]
    pub fn on_change(mut self, handler: impl Fn(&MockDriver, &str) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(handler));
        self
    }
}

#[derive(Default)]
struct MockDom {
    nodes: Vec<MockNode>,
    url: String,
    title: String,
    history: Vec<String>,
    position: usize,
    calls: Vec<String>,
    screenshots: usize,
    script_queries: bool,
    native_select_fails: bool,
    screenshots_fail: bool,
    session_closed: bool,
    on_navigate: Option<MockHandler>,
}

impl MockDom {
    fn check_session(&self) -> DriverResult<()> {
        if self.session_closed {
            Err(DriverError::new(
                DriverErrorKind::SessionLost,
                "invalid session id",
            ))
        } else {
            Ok(())
        }
    }

    fn node(&self, element: MockElement) -> DriverResult<&MockNode> {
        match self.nodes.get(element.0) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(stale()),
        }
    }

    fn node_mut(&mut self, element: MockElement) -> DriverResult<&mut MockNode> {
        match self.nodes.get_mut(element.0) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(stale()),
        }
    }

    fn is_descendant(&self, mut index: usize, ancestor: usize) -> bool {
        while let Some(parent) = self.nodes[index].parent {
            if parent == ancestor {
                return true;
            }
            index = parent;
        }
        false
    }

    fn displayed(&self, index: usize) -> bool {
        let mut current = Some(index);
        while let Some(i) = current {
            if !self.nodes[i].displayed {
                return false;
            }
            current = self.nodes[i].parent;
        }
        true
    }

    fn matching(&mut self, parent: Option<usize>, locator: &Locator) -> Vec<MockElement> {
        let candidates: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| {
                let node = &self.nodes[i];
                !node.removed
                    && node.locators.contains(locator)
                    && parent.map_or(true, |p| self.is_descendant(i, p))
            })
            .collect();
        let mut found = Vec::new();
        for i in candidates {
            let node = &mut self.nodes[i];
            if node.absent_polls > 0 {
                node.absent_polls -= 1;
            } else {
                found.push(MockElement(i));
            }
        }
        found
    }

    fn remove_subtree(&mut self, root: usize) {
        for i in 0..self.nodes.len() {
            if i == root || self.is_descendant(i, root) {
                self.nodes[i].removed = true;
            }
        }
    }
}

fn stale() -> DriverError {
    DriverError::new(
        DriverErrorKind::StaleElement,
        "element is not attached to the page document",
    )
}

fn script_name(script: &str) -> &'static str {
    match script {
        scripts::CLICK => "click",
        scripts::SCROLL_INTO_VIEW => "scroll_into_view",
        scripts::SET_VALUE_AND_CHANGE => "set_value_and_change",
        scripts::SET_VALUE_AND_INPUT => "set_value_and_input",
        scripts::SCROLL_TO_BOTTOM => "scroll_to_bottom",
        scripts::SCROLL_TO_TOP => "scroll_to_top",
        scripts::IMAGE_LOADED => "image_loaded",
        scripts::TEXT_CONTENT => "text_content",
        _ => "custom",
    }
}

/// Mock driver for unit testing
#[derive(Clone)]
pub struct MockDriver {
    dom: Arc<Mutex<MockDom>>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dom = self.dom();
        f.debug_struct("MockDriver")
            .field("url", &dom.url)
            .field("nodes", &dom.nodes.len())
            .field("calls", &dom.calls.len())
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create an empty document at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let dom = MockDom {
            url: "about:blank".to_string(),
            script_queries: true,
            ..MockDom::default()
        };
        Self {
            dom: Arc::new(Mutex::new(dom)),
        }
    }

    fn dom(&self) -> MutexGuard<'_, MockDom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a top-level node
    pub fn add(&self, node: MockNode) -> MockElement {
        let mut dom = self.dom();
        dom.nodes.push(node);
        MockElement(dom.nodes.len() - 1)
    }

    /// Add a node under `parent`
    pub fn add_child(&self, parent: MockElement, mut node: MockNode) -> MockElement {
        node.parent = Some(parent.0);
        self.add(node)
    }

    /// Detach a node and its descendants; existing handles go stale
    pub fn remove(&self, element: MockElement) {
        self.dom().remove_subtree(element.0);
    }

    /// Detach every node
    pub fn clear_dom(&self) {
        for node in &mut self.dom().nodes {
            node.removed = true;
        }
    }

    /// Modify a node in place
    pub fn update(&self, element: MockElement, f: impl FnOnce(&mut MockNode)) {
        if let Some(node) = self.dom().nodes.get_mut(element.0) {
            f(node);
        }
    }

    /// Current value of a form control
    #[must_use]
    pub fn value_of(&self, element: MockElement) -> Option<String> {
        self.dom().nodes.get(element.0).and_then(|n| n.value.clone())
    }

    /// Number of attached nodes
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dom().nodes.iter().filter(|n| !n.removed).count()
    }

    /// Set URL and title without navigating
    pub fn set_location(&self, url: &str, title: &str) {
        let mut dom = self.dom();
        dom.url = url.to_string();
        dom.title = title.to_string();
        if dom.history.is_empty() {
            dom.history.push(url.to_string());
        }
    }

    /// Set the document title
    pub fn set_title(&self, title: &str) {
        self.dom().title = title.to_string();
    }

    /// Handler rendering the document for a URL
    pub fn on_navigate(&self, handler: impl Fn(&MockDriver, &str) + Send + Sync + 'static) {
        self.dom().on_navigate = Some(Arc::new(handler));
    }

    /// App-initiated navigation (form submit, link click)
    pub fn navigate(&self, url: &str) {
        let handler = {
            let mut dom = self.dom();
            dom.calls.push(format!("navigate:{url}"));
            let keep = if dom.history.is_empty() {
                0
            } else {
                dom.position + 1
            };
            dom.history.truncate(keep);
            dom.history.push(url.to_string());
            dom.position = dom.history.len() - 1;
            dom.url = url.to_string();
            dom.on_navigate.clone()
        };
        if let Some(render) = handler {
            render(self, url);
        }
    }

    fn rerender(&self) {
        let (handler, url) = {
            let dom = self.dom();
            (dom.on_navigate.clone(), dom.url.clone())
        };
        if let Some(render) = handler {
            render(self, &url);
        }
    }

    /// Whether script-level queries resolve elements
    pub fn set_script_queries(&self, enabled: bool) {
        self.dom().script_queries = enabled;
    }

    /// Make every native `select_by_value` fail
    pub fn fail_native_select(&self, fail: bool) {
        self.dom().native_select_fails = fail;
    }

    /// Make screenshots fail
    pub fn fail_screenshots(&self, fail: bool) {
        self.dom().screenshots_fail = fail;
    }

    /// Simulate a lost session; every later call fails
    pub fn lose_session(&self) {
        self.dom().session_closed = true;
    }

    /// Whether `quit` was called or the session was lost
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.dom().session_closed
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.dom().calls.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.dom().calls.iter().any(|c| c.starts_with(method))
    }

    /// Count calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.dom()
            .calls
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.dom().calls.clear();
    }

    /// Number of screenshots taken
    #[must_use]
    pub fn screenshot_count(&self) -> usize {
        self.dom().screenshots
    }

    fn record(&self, call: String) -> DriverResult<MutexGuard<'_, MockDom>> {
        let mut dom = self.dom();
        dom.calls.push(call);
        dom.check_session()?;
        Ok(dom)
    }

    fn set_value_and_notify(&self, element: MockElement, value: &str) -> DriverResult<()> {
        let handler = {
            let mut dom = self.dom();
            let node = dom.node_mut(element)?;
            node.value = Some(value.to_string());
            node.on_change.clone()
        };
        if let Some(handler) = handler {
            handler(self, value);
        }
        Ok(())
    }

    fn fire_click(&self, element: MockElement) -> DriverResult<()> {
        let handler = self.dom().node(element)?.on_click.clone();
        if let Some(handler) = handler {
            handler(self, "");
        }
        Ok(())
    }

    fn history_step(&self, forward: bool) -> DriverResult<()> {
        let moved = {
            let mut dom = self.record(if forward { "forward" } else { "back" }.to_string())?;
            let target = if forward {
                (dom.position + 1 < dom.history.len()).then(|| dom.position + 1)
            } else {
                dom.position.checked_sub(1)
            };
            match target {
                Some(position) => {
                    dom.position = position;
                    dom.url = dom.history[position].clone();
                    true
                }
                None => false,
            }
        };
        if moved {
            self.rerender();
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Element = MockElement;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.dom().check_session()?;
        self.navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.record("current_url".to_string())?.url.clone())
    }

    async fn title(&self) -> DriverResult<String> {
        Ok(self.record("title".to_string())?.title.clone())
    }

    async fn back(&self) -> DriverResult<()> {
        self.history_step(false)
    }

    async fn forward(&self) -> DriverResult<()> {
        self.history_step(true)
    }

    async fn refresh(&self) -> DriverResult<()> {
        drop(self.record("refresh".to_string())?);
        self.rerender();
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<MockElement>> {
        let mut dom = self.record(format!("find_all:{locator}"))?;
        Ok(dom.matching(None, locator))
    }

    async fn find_all_in(
        &self,
        parent: &MockElement,
        locator: &Locator,
    ) -> DriverResult<Vec<MockElement>> {
        let mut dom = self.record(format!("find_all_in:{locator}"))?;
        dom.node(*parent)?;
        Ok(dom.matching(Some(parent.0), locator))
    }

    async fn text(&self, element: &MockElement) -> DriverResult<String> {
        let dom = self.record("text".to_string())?;
        let node = dom.node(*element)?;
        Ok(if dom.displayed(element.0) {
            node.text.clone()
        } else {
            String::new()
        })
    }

    async fn attribute(&self, element: &MockElement, name: &str) -> DriverResult<Option<String>> {
        let dom = self.record(format!("attribute:{name}"))?;
        let node = dom.node(*element)?;
        Ok(match name {
            "value" => node.value.clone(),
            _ => node.attrs.get(name).cloned(),
        })
    }

    async fn is_displayed(&self, element: &MockElement) -> DriverResult<bool> {
        let dom = self.record("is_displayed".to_string())?;
        dom.node(*element)?;
        Ok(dom.displayed(element.0))
    }

    async fn is_enabled(&self, element: &MockElement) -> DriverResult<bool> {
        let dom = self.record("is_enabled".to_string())?;
        Ok(dom.node(*element)?.enabled)
    }

    async fn click(&self, element: &MockElement) -> DriverResult<()> {
        {
            let mut dom = self.record("click".to_string())?;
            let displayed = dom.displayed(element.0);
            let node = dom.node_mut(*element)?;
            if !displayed {
                return Err(DriverError::new(
                    DriverErrorKind::NotInteractable,
                    "element not interactable",
                ));
            }
            if let Some(kind) = node.click_failures.pop_front() {
                return Err(DriverError::new(kind, format!("{} (injected)", kind.as_str())));
            }
            if !node.enabled {
                return Ok(());
            }
        }
        self.fire_click(*element)
    }

    async fn clear(&self, element: &MockElement) -> DriverResult<()> {
        let mut dom = self.record("clear".to_string())?;
        dom.node_mut(*element)?.value = Some(String::new());
        Ok(())
    }

    async fn send_keys(&self, element: &MockElement, text: &str) -> DriverResult<()> {
        let mut dom = self.record(format!("send_keys:{text}"))?;
        let displayed = dom.displayed(element.0);
        let node = dom.node_mut(*element)?;
        if !displayed {
            return Err(DriverError::new(
                DriverErrorKind::NotInteractable,
                "element not interactable",
            ));
        }
        node.value.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }

    async fn select_by_value(&self, element: &MockElement, value: &str) -> DriverResult<()> {
        {
            let dom = self.record(format!("select_by_value:{value}"))?;
            let node = dom.node(*element)?;
            if dom.native_select_fails {
                return Err(DriverError::new(
                    DriverErrorKind::Other,
                    "select_by_value is not supported for this control",
                ));
            }
            if !node.options.iter().any(|o| o == value) {
                return Err(DriverError::new(
                    DriverErrorKind::NoSuchElement,
                    format!("cannot locate option with value: {value}"),
                ));
            }
        }
        self.set_value_and_notify(*element, value)
    }

    async fn execute(&self, script: &str, _args: Vec<Value>) -> DriverResult<Value> {
        let name = script_name(script);
        drop(self.record(format!("execute:{name}"))?);
        match script {
            scripts::SCROLL_TO_BOTTOM | scripts::SCROLL_TO_TOP => Ok(Value::Null),
            _ => Err(DriverError::new(
                DriverErrorKind::Script,
                format!("unsupported script: {script}"),
            )),
        }
    }

    async fn execute_on(
        &self,
        script: &str,
        element: &MockElement,
        args: Vec<Value>,
    ) -> DriverResult<Value> {
        let name = script_name(script);
        let result = {
            let dom = self.record(format!("execute_on:{name}"))?;
            let node = dom.node(*element)?;
            match script {
                scripts::IMAGE_LOADED => Some(Value::Bool(
                    node.attrs.get("loaded").map_or(true, |v| v != "false"),
                )),
                scripts::TEXT_CONTENT => Some(Value::String(
                    node.attrs
                        .get("textContent")
                        .cloned()
                        .unwrap_or_else(|| node.text.clone()),
                )),
                scripts::SCROLL_INTO_VIEW => Some(Value::Null),
                scripts::CLICK | scripts::SET_VALUE_AND_CHANGE | scripts::SET_VALUE_AND_INPUT => None,
                _ => {
                    return Err(DriverError::new(
                        DriverErrorKind::Script,
                        format!("unsupported script: {script}"),
                    ))
                }
            }
        };
        if let Some(value) = result {
            return Ok(value);
        }
        if script == scripts::CLICK {
            self.fire_click(*element)?;
        } else {
            let value = args.first().and_then(Value::as_str).unwrap_or_default();
            self.set_value_and_notify(*element, value)?;
        }
        Ok(Value::Null)
    }

    async fn query_by_script(&self, locator: &Locator) -> DriverResult<Option<MockElement>> {
        let mut dom = self.record(format!("query_by_script:{locator}"))?;
        if !dom.script_queries {
            return Ok(None);
        }
        Ok(dom.matching(None, locator).into_iter().next())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        let mut dom = self.record("screenshot".to_string())?;
        if dom.screenshots_fail {
            return Err(DriverError::new(DriverErrorKind::Other, "screenshot failed"));
        }
        dom.screenshots += 1;
        Ok(PIXEL_PNG.to_vec())
    }

    async fn quit(&self) -> DriverResult<()> {
        let mut dom = self.record("quit".to_string())?;
        dom.session_closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const ROW: Locator = Locator::xpath("//div[contains(@class,'cart_item')]");
    const NAME: Locator = Locator::xpath(".//div[contains(@class,'inventory_item_name')]");

    mod tree_tests {
        use super::*;

        #[tokio::test]
        async fn test_find_all_in_scopes_to_parent() {
            let driver = MockDriver::new();
            let a = driver.add(MockNode::new("div").matching(ROW));
            let b = driver.add(MockNode::new("div").matching(ROW));
            driver.add_child(a, MockNode::new("div").matching(NAME).with_text("A"));
            driver.add_child(b, MockNode::new("div").matching(NAME).with_text("B"));

            let names = driver.find_all_in(&b, &NAME).await.unwrap();
            assert_eq!(names.len(), 1);
            assert_eq!(driver.text(&names[0]).await.unwrap(), "B");
        }

        #[tokio::test]
        async fn test_removed_node_is_stale() {
            let driver = MockDriver::new();
            let row = driver.add(MockNode::new("div").matching(ROW));
            let child = driver.add_child(row, MockNode::new("div").matching(NAME));
            driver.remove(row);

            let err = driver.text(&child).await.unwrap_err();
            assert_eq!(err.kind, DriverErrorKind::StaleElement);
            assert!(driver.find_all(&ROW).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_hidden_parent_hides_child() {
            let driver = MockDriver::new();
            let panel = driver.add(MockNode::new("nav").hidden());
            let link = driver.add_child(panel, MockNode::new("a").with_text("Logout"));
            assert!(!driver.is_displayed(&link).await.unwrap());
            assert_eq!(driver.text(&link).await.unwrap(), "");
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_history_back_forward() {
            let driver = MockDriver::new();
            driver.goto("https://a.test/1").await.unwrap();
            driver.goto("https://a.test/2").await.unwrap();
            driver.back().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://a.test/1");
            driver.forward().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://a.test/2");
        }

        #[tokio::test]
        async fn test_quit_closes_session() {
            let driver = MockDriver::new();
            driver.quit().await.unwrap();
            let err = driver.title().await.unwrap_err();
            assert_eq!(err.kind, DriverErrorKind::SessionLost);
            assert!(driver.is_closed());
        }
    }

    mod script_tests {
        use super::*;

        #[tokio::test]
        async fn test_unknown_script_is_a_script_error() {
            let driver = MockDriver::new();
            let err = driver.execute("return 1;", Vec::new()).await.unwrap_err();
            assert_eq!(err.kind, DriverErrorKind::Script);
            assert!(driver.was_called("execute:custom"));
        }

        #[tokio::test]
        async fn test_image_loaded_probe() {
            let driver = MockDriver::new();
            let ok = driver.add(MockNode::new("img"));
            let broken = driver.add(MockNode::new("img").with_attr("loaded", "false"));
            assert_eq!(
                driver.execute_on(scripts::IMAGE_LOADED, &ok, Vec::new()).await.unwrap(),
                Value::Bool(true)
            );
            assert_eq!(
                driver
                    .execute_on(scripts::IMAGE_LOADED, &broken, Vec::new())
                    .await
                    .unwrap(),
                Value::Bool(false)
            );
        }
    }
}
