//! STG Catalog Core - Shared domain types.
//!
//! This crate provides the types used by the storefront and its tests:
//! - typed ids, emails, money formatting and order status
//! - the form validation contracts for login and registration
//! - the human-readable order summary sent through the messaging deep link
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything that talks to the hosted backend lives in the
//! storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, money, statuses and icons
//! - [`validation`] - Login and registration form contracts
//! - [`order_summary`] - Order message and messaging link

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order_summary;
pub mod types;
pub mod validation;

pub use order_summary::{OrderSummary, SummaryLine, messaging_link};
pub use types::*;
pub use validation::{FieldErrors, LoginInput, RegistrationInput};
