//! Profile view.

use tracing::instrument;

use crate::backend::{Gateway, Query, Table};
use crate::models::{AuthSession, Profile};

/// What the profile page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Reads a user's profile.
pub struct Profiles<'g, G> {
    gateway: &'g G,
}

impl<'g, G: Gateway> Profiles<'g, G> {
    #[must_use]
    pub const fn new(gateway: &'g G) -> Self {
        Self { gateway }
    }

    /// The `profiles` row for `owner`, or the identity's own metadata when
    /// the row is missing or cannot be read.
    #[instrument(skip_all, fields(user_id = %owner.identity.id))]
    pub async fn profile(&self, owner: &AuthSession) -> ProfileView {
        let result = self
            .gateway
            .select::<Profile>(
                Table::Profiles,
                &Query::new().eq("id", owner.identity.id),
                Some(&owner.access_token),
            )
            .await;

        match result.map(|rows| rows.into_iter().next()) {
            Ok(Some(row)) => ProfileView {
                name: row.name,
                email: row.email,
                phone: row.phone,
            },
            Ok(None) => identity_view(owner),
            Err(e) => {
                tracing::warn!(error = %e, "Profile read failed, using identity metadata");
                identity_view(owner)
            }
        }
    }
}

fn identity_view(owner: &AuthSession) -> ProfileView {
    ProfileView {
        name: owner.identity.name.clone(),
        email: Some(owner.identity.email.clone()).filter(|e| !e.is_empty()),
        phone: owner.identity.phone.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryBackend, Operation};
    use crate::services::cart::tests::signed_in;

    #[tokio::test]
    async fn test_profile_row_wins() {
        let backend = InMemoryBackend::new();
        let owner = signed_in(&backend);
        backend.seed(
            Table::Profiles,
            [Profile {
                id: owner.identity.id,
                name: Some("Ana Souza".to_string()),
                email: Some("ana@example.com".to_string()),
                phone: Some("11987654321".to_string()),
            }],
        );

        let view = Profiles::new(&backend).profile(&owner).await;
        assert_eq!(view.name.as_deref(), Some("Ana Souza"));
        assert_eq!(view.phone.as_deref(), Some("11987654321"));
    }

    #[tokio::test]
    async fn test_missing_row_falls_back_to_identity() {
        let backend = InMemoryBackend::new();
        let owner = signed_in(&backend);

        let view = Profiles::new(&backend).profile(&owner).await;
        assert_eq!(view.email.as_deref(), Some("ana@example.com"));
        assert_eq!(view.name, None);
    }

    #[tokio::test]
    async fn test_read_failure_falls_back_to_identity() {
        let backend = InMemoryBackend::new();
        let owner = signed_in(&backend);
        backend.fail(Table::Profiles, Operation::Select);

        let view = Profiles::new(&backend).profile(&owner).await;
        assert_eq!(view.email.as_deref(), Some("ana@example.com"));
    }
}
