//! Domain models for the storefront.
//!
//! Row types mirror the backend tables one to one. `New*` types are insert
//! payloads: the backend assigns `id` and `created_at`.

mod cart;
mod catalog;
mod order;
mod profile;
pub mod session;

pub use cart::{CartLine, NewCartLine, QuantityPatch};
pub use catalog::{Category, Product};
pub use order::{NewOrder, NewOrderLine, Order, OrderLine};
pub use profile::Profile;
pub use session::{AccessToken, AuthSession, Identity, UserMetadata, keys as session_keys};
