//! Session-related types.
//!
//! An [`AuthSession`] is what the identity provider hands back on sign-in. It
//! is stored in the cookie-keyed server session so the next request can
//! restore it without a network round trip.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use stg_catalog_core::UserId;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// Bearer token for the signed-in user.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl Serialize for AccessToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for AccessToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Free-form profile data attached to an identity at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// The signed-in user as the identity provider describes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A live session: identity plus the tokens that authorize it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    pub access_token: AccessToken,
    #[serde(with = "secret_string")]
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the access token is expired (or about to be) at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_LEEWAY_SECONDS) <= now
    }
}

mod secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        String::deserialize(deserializer).map(SecretString::from)
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the signed-in user's [`super::AuthSession`].
    pub const AUTH_SESSION: &str = "auth_session";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            identity: Identity {
                id: UserId::generate(),
                email: "ana@example.com".to_string(),
                name: Some("Ana".to_string()),
                phone: None,
            },
            access_token: AccessToken::new("access-abc"),
            refresh_token: SecretString::from("refresh-xyz"),
            expires_at,
        }
    }

    #[test]
    fn test_expiry_uses_leeway() {
        let now = Utc::now();
        assert!(session(now - Duration::minutes(1)).is_expired(now));
        assert!(session(now + Duration::seconds(10)).is_expired(now));
        assert!(!session(now + Duration::minutes(10)).is_expired(now));
    }

    #[test]
    fn test_session_survives_serde() {
        let original = session(Utc::now() + Duration::hours(1));
        let json = serde_json::to_string(&original).unwrap();
        let restored: AuthSession = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.identity, original.identity);
        assert_eq!(restored.access_token.expose(), "access-abc");
        assert_eq!(restored.refresh_token.expose_secret(), "refresh-xyz");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", session(Utc::now()));
        assert!(!debug.contains("access-abc"));
        assert!(!debug.contains("refresh-xyz"));
    }
}
