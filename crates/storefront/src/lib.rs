//! STG Catalog storefront library.
//!
//! Server-rendered storefront over a hosted backend: catalog browsing,
//! a per-user cart, order confirmation, order history and profile. The
//! binary in `main.rs` wires this library into a server; the integration
//! tests drive it directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
