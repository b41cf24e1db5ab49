//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use category::CategoryIcon;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{format_brl, line_total};
pub use status::OrderStatus;
