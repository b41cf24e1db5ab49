//! Order status.
//!
//! The storefront only ever writes `"pending"`, but other systems may move
//! an order through states this crate does not know about. The status is
//! therefore an open string rather than a closed enum.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Free-text order status as stored in the `orders` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Status written for every order the storefront places.
    pub const PENDING: &'static str = "pending";

    /// The status of a freshly placed order.
    #[must_use]
    pub fn pending() -> Self {
        Self(Self::PENDING.to_owned())
    }

    /// Wrap a status read from the backend.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the initial `pending` status.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0 == Self::PENDING
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::pending()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
