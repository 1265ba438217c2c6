//! Login page.

use crate::driver::Driver;
use crate::locator::Locator;
use crate::page_object::{not_loaded, PageContext, PageObject};
use crate::result::ProbeResult;
use crate::wait::Condition;
use async_trait::async_trait;

/// Username input
pub const USERNAME: Locator = Locator::id("user-name");
/// Password input
pub const PASSWORD: Locator = Locator::id("password");
/// Submit button
pub const LOGIN_BUTTON: Locator = Locator::id("login-button");
/// Error banner shown after a rejected login
pub const ERROR_MESSAGE: Locator = Locator::css("h3[data-test='error']");

const ALL: &[Locator] = &[USERNAME, PASSWORD, LOGIN_BUTTON, ERROR_MESSAGE];

/// The login form at the store's base URL
#[derive(Debug)]
pub struct LoginView<'a, D: Driver> {
    ctx: PageContext<'a, D>,
}

impl<'a, D: Driver> LoginView<'a, D> {
    /// Create the view
    #[must_use]
    pub const fn new(ctx: PageContext<'a, D>) -> Self {
        Self { ctx }
    }

    /// Navigate to `base_url` and wait for both credential fields.
    ///
    /// A form that does not show up is given one page refresh.
    ///
    /// # Errors
    ///
    /// [`crate::ProbeError::PageNotLoaded`] if the form is still missing
    /// after the refresh, or a driver error from navigation.
    pub async fn open(&self, base_url: &str) -> ProbeResult<()> {
        let driver = self.ctx.driver();
        tracing::info!("Opening login page {base_url}");
        driver.goto(base_url).await?;
        if let Err(first) = self.fields_present().await {
            tracing::warn!("Login form not ready ({first}); refreshing once");
            driver.refresh().await?;
            self.fields_present()
                .await
                .map_err(|e| not_loaded(<Self as PageObject<D>>::NAME, e))?;
        }
        Ok(())
    }

    /// Type into the username field, replacing its content
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn enter_username(&self, username: &str) -> ProbeResult<()> {
        self.ctx.actions().set_value(&USERNAME, username).await?;
        Ok(())
    }

    /// Type into the password field, replacing its content
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn enter_password(&self, password: &str) -> ProbeResult<()> {
        self.ctx.actions().set_value(&PASSWORD, password).await?;
        Ok(())
    }

    /// Submit the form
    ///
    /// # Errors
    ///
    /// Propagates the interaction failure.
    pub async fn click_login(&self) -> ProbeResult<()> {
        self.ctx.actions().click(&LOGIN_BUTTON).await?;
        Ok(())
    }

    /// Fill both fields and submit.
    ///
    /// Says nothing about whether the login was accepted; check the URL or
    /// [`LoginView::error_message`] afterwards.
    ///
    /// # Errors
    ///
    /// Propagates the first interaction failure.
    pub async fn login(&self, username: &str, password: &str) -> ProbeResult<()> {
        tracing::info!("Logging in as {username:?}");
        self.enter_username(username).await?;
        self.enter_password(password).await?;
        self.click_login().await
    }

    /// Text of the error banner, or an empty string when none appears
    ///
    /// # Errors
    ///
    /// Driver faults other than a missing element.
    pub async fn error_message(&self) -> ProbeResult<String> {
        if !self.ctx.appears(&ERROR_MESSAGE).await {
            return Ok(String::new());
        }
        Ok(self.ctx.text_now(&ERROR_MESSAGE).await?.unwrap_or_default())
    }

    /// Whether the login button is showing, i.e. we are still on the form
    pub async fn is_login_button_displayed(&self) -> bool {
        self.ctx.appears(&LOGIN_BUTTON).await
    }

    async fn fields_present(&self) -> ProbeResult<()> {
        let waiter = self.ctx.waiter();
        waiter.wait_for_element(&USERNAME, Condition::Present).await?;
        waiter.wait_for_element(&PASSWORD, Condition::Present).await?;
        Ok(())
    }
}

#[async_trait]
impl<D: Driver> PageObject<D> for LoginView<'_, D> {
    const NAME: &'static str = "login";

    fn locators() -> &'static [Locator] {
        ALL
    }

    fn ready_locator(&self) -> Locator {
        LOGIN_BUTTON
    }

    fn context(&self) -> &PageContext<'_, D> {
        &self.ctx
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockNode, MockStorefront};
    use crate::telemetry::Telemetry;
    use crate::wait::WaitSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> WaitSpec {
        WaitSpec::new().with_timeout(300).with_poll_interval(5)
    }

    mod login_tests {
        use super::*;

        #[tokio::test]
        async fn test_standard_user_reaches_inventory() {
            let store = MockStorefront::new();
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());
            let login = LoginView::new(ctx);

            login.open(store.base_url()).await.unwrap();
            login.login("standard_user", "secret_sauce").await.unwrap();

            let url = store.driver().current_url().await.unwrap();
            assert!(url.ends_with("/inventory.html"));
            assert!(store.is_logged_in());
        }

        #[tokio::test]
        async fn test_locked_user_sees_banner() {
            let store = MockStorefront::new();
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());
            let login = LoginView::new(ctx);

            login.open(store.base_url()).await.unwrap();
            login.login("locked_out_user", "secret_sauce").await.unwrap();

            let message = login.error_message().await.unwrap();
            assert!(message.contains("Sorry, this user has been locked out"));
            assert!(login.is_login_button_displayed().await);
        }

        #[tokio::test]
        async fn test_empty_username_is_required() {
            let store = MockStorefront::new();
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());
            let login = LoginView::new(ctx);

            login.open(store.base_url()).await.unwrap();
            login.login("", "secret_sauce").await.unwrap();

            assert!(login.error_message().await.unwrap().contains("Username is required"));
        }

        #[tokio::test]
        async fn test_no_banner_reads_empty() {
            let store = MockStorefront::new();
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());
            let login = LoginView::new(ctx);

            login.open(store.base_url()).await.unwrap();
            assert_eq!(login.error_message().await.unwrap(), "");
        }

        #[tokio::test]
        async fn test_retyping_replaces_value() {
            let store = MockStorefront::new();
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(store.driver(), &telemetry).with_spec(fast());
            let login = LoginView::new(ctx);

            login.open(store.base_url()).await.unwrap();
            login.enter_username("first").await.unwrap();
            login.enter_username("standard_user").await.unwrap();
            login.enter_password("secret_sauce").await.unwrap();
            login.click_login().await.unwrap();

            assert!(store.is_logged_in());
        }
    }

    mod open_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_refreshes_once_when_form_missing() {
            let driver = MockDriver::new();
            let renders = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&renders);
            driver.on_navigate(move |d, _url| {
                d.clear_dom();
                if counter.fetch_add(1, Ordering::SeqCst) > 0 {
                    d.add(MockNode::new("input").matching(USERNAME));
                    d.add(MockNode::new("input").matching(PASSWORD));
                    d.add(MockNode::new("input").matching(LOGIN_BUTTON));
                }
            });
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(&driver, &telemetry).with_spec(fast());

            LoginView::new(ctx).open("https://shop.test").await.unwrap();

            assert_eq!(driver.call_count("refresh"), 1);
            assert_eq!(renders.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn test_open_fails_after_one_refresh() {
            let driver = MockDriver::new();
            let telemetry = Telemetry::disabled();
            let ctx = PageContext::new(&driver, &telemetry).with_spec(fast());

            let err = LoginView::new(ctx).open("https://shop.test").await.unwrap_err();

            assert!(matches!(err, crate::ProbeError::PageNotLoaded { .. }));
            assert_eq!(driver.call_count("refresh"), 1);
        }
    }
}
