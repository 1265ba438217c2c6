//! Live-browser runs against the real store.
//!
//! Enabled with `--features live`. Needs chromedriver or msedgedriver on
//! PATH or in one of the fallback directories, and network access to
//! `BASE_URL` (default https://www.saucedemo.com).

#![cfg(feature = "live")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use shopcheck::pages::{CatalogView, LoginView};
use shopcheck::{
    run_suite, with_session, CredentialsSource, DriverBinaryLocator, PageContext, PageObject,
    ProbeConfig, SessionProvider, Suite, Telemetry,
};

fn provider() -> SessionProvider {
    SessionProvider::new(DriverBinaryLocator::new(env!("CARGO_MANIFEST_DIR")))
}

fn config() -> ProbeConfig {
    ProbeConfig::from_env().expect("BASE_URL / DEFAULT_BROWSER should be valid")
}

#[tokio::test]
async fn test_live_login_lands_on_catalog() {
    let config = config();
    let telemetry = Telemetry::disabled();
    let base_url = config.base_url.clone();

    let names = with_session(&provider(), &config.session(), |driver| {
        let telemetry = &telemetry;
        let base_url = base_url.as_str();
        async move {
            let ctx = PageContext::new(&driver, telemetry);
            let login = LoginView::new(ctx);
            login.open(base_url).await?;
            login.login("standard_user", "secret_sauce").await?;
            let catalog = CatalogView::new(ctx);
            catalog.wait_arrived().await?;
            catalog.item_names().await
        }
    })
    .await
    .unwrap();

    assert_eq!(names.len(), 6);
}

#[tokio::test]
async fn test_live_standard_suite() {
    let config = config();
    let suite = Suite::standard()
        .with_credentials(&CredentialsSource::from_path(&config.credentials_path))
        .unwrap();
    let telemetry = Telemetry::new(&config.screenshot_dir);

    let report = run_suite(&provider(), &suite, &config, &telemetry).await;

    assert!(report.is_success(), "{}", report.render_text());
}
