//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `session` - Auth state holder and access guard
//! - `cart` - Cart holder mirroring the user's `cart_items`
//! - `checkout` - Order confirmation
//! - `catalog` - Categories and products
//! - `orders` - Order history
//! - `profile` - Profile view with identity fallback
//!
//! Services borrow a [`crate::backend::Gateway`] and are built per request.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod profile;
pub mod session;

pub use cart::{CartError, CartHolder, CartRow, cart_total};
pub use catalog::{Catalog, CategoryFilter};
pub use checkout::{CheckoutError, PlacedOrder, confirm_order};
pub use orders::{OrderHistory, OrderWithLines};
pub use profile::{ProfileView, Profiles};
pub use session::{Access, AuthState, SessionError, SessionHolder, access};
