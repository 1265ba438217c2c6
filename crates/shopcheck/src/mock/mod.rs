//! In-memory test doubles.
//!
//! [`MockDriver`] is a scriptable document for unit tests of the wait engine
//! and actions; [`MockStorefront`] renders the store on top of it so page
//! objects and scenarios run without a browser.

pub mod driver;
pub mod storefront;

pub use driver::{MockDriver, MockElement, MockHandler, MockNode};
pub use storefront::{
    MockStorefront, StoreProduct, StorefrontSession, StorefrontSessions, BASE_URL, PRODUCTS,
};
