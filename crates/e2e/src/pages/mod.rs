//! Page objects for the Demoblaze storefront screens
//!
//! Each page object borrows the live [`Session`](crate::session::Session)
//! and exposes only the actions and queries that screen supports, built on
//! the [`Waiter`](crate::wait::Waiter) helpers. Locators are fixed consts
//! copied from the site's current markup; selector drift in the site is an
//! expected failure mode, not a bug here.

mod cart;
mod checkout;
mod home;
mod product;

pub use cart::{CartItem, CartPage};
pub use checkout::{CheckoutPage, CustomerData};
pub use home::{Category, HomePage};
pub use product::ProductPage;
