//! Page objects for the Sauce Demo store.
//!
//! One view per page or page region. Each view borrows a
//! [`PageContext`](crate::page_object::PageContext) and exposes the page's
//! locators as public constants so the mock storefront renders the same
//! structure the views look for.

pub mod cart;
pub mod checkout;
pub mod checkout_complete;
pub mod details;
pub mod inventory;
pub mod login;
pub mod menu;

pub use cart::{CartLine, CartView};
pub use checkout::{CheckoutInfoView, CheckoutOverviewView, CheckoutSummary};
pub use checkout_complete::CheckoutCompleteView;
pub use details::DetailView;
pub use inventory::{CatalogView, SortOrder};
pub use login::LoginView;
pub use menu::MenuView;

/// Title shown on every store page
pub const STORE_TITLE: &str = "Swag Labs";
