//! Profile rows.

use serde::{Deserialize, Serialize};

use stg_catalog_core::UserId;

/// Backend-side profile, keyed by the identity's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}
