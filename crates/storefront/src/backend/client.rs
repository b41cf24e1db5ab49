//! HTTP client for the hosted backend.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use stg_catalog_core::UserId;

use super::{AuthGateway, Gateway, GatewayError, Query, SignUpOutcome, Table};
use crate::config::BackendConfig;
use crate::models::{AccessToken, AuthSession, Identity, UserMetadata};

/// Maximum number of body characters kept in error messages and logs.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the hosted backend's data and identity APIs.
///
/// Cheap to clone: the connection pool and configuration live behind an `Arc`.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    rest_url: Url,
    auth_url: Url,
    anon_key: SecretString,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be extended with the API
    /// paths or the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, GatewayError> {
        let base = with_trailing_slash(&config.url)?;
        let rest_url = base.join("rest/v1/")?;
        let auth_url = base.join("auth/v1/")?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http: builder.build()?,
                rest_url,
                auth_url,
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    fn table_url(&self, table: Table, params: &[(String, String)]) -> Result<Url, GatewayError> {
        let mut url = self.inner.rest_url.join(table.as_str())?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn auth_endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.inner.auth_url.join(path)?)
    }

    /// Start a request carrying the anon key and the caller's bearer token.
    fn request(&self, method: Method, url: Url, token: Option<&AccessToken>) -> RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        let bearer = token.map_or(anon_key, AccessToken::expose);
        self.inner
            .http
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, GatewayError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!(
                status = %status,
                message = %message,
                "Backend returned non-success status"
            );
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let body = self.send(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse backend response"
            );
            GatewayError::Parse(e)
        })
    }
}

impl Gateway for BackendClient {
    #[instrument(skip(self, query, token), fields(table = %table))]
    async fn select<T>(
        &self,
        table: Table,
        query: &Query,
        token: Option<&AccessToken>,
    ) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.table_url(table, &query.params())?;
        debug!(url = %url, "select");
        self.send_json(self.request(Method::GET, url, token)).await
    }

    #[instrument(skip(self, rows, token), fields(table = %table, count = rows.len()))]
    async fn insert<R, T>(
        &self,
        table: Table,
        rows: &[R],
        token: Option<&AccessToken>,
    ) -> Result<Vec<T>, GatewayError>
    where
        R: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let body = serde_json::to_vec(rows)?;
        let url = self.table_url(table, &[("select".to_string(), "*".to_string())])?;
        let builder = self
            .request(Method::POST, url, token)
            .header("Prefer", "return=representation")
            .header("Content-Type", "application/json")
            .body(body);
        self.send_json(builder).await
    }

    #[instrument(skip(self, query, patch, token), fields(table = %table))]
    async fn update<P>(
        &self,
        table: Table,
        query: &Query,
        patch: &P,
        token: Option<&AccessToken>,
    ) -> Result<(), GatewayError>
    where
        P: Serialize + Sync,
    {
        let body = serde_json::to_vec(patch)?;
        let url = self.table_url(table, &query.filter_params())?;
        let builder = self
            .request(Method::PATCH, url, token)
            .header("Content-Type", "application/json")
            .body(body);
        self.send(builder).await.map(|_| ())
    }

    #[instrument(skip(self, query, token), fields(table = %table))]
    async fn delete(
        &self,
        table: Table,
        query: &Query,
        token: Option<&AccessToken>,
    ) -> Result<(), GatewayError> {
        let url = self.table_url(table, &query.filter_params())?;
        self.send(self.request(Method::DELETE, url, token))
            .await
            .map(|_| ())
    }
}

// =============================================================================
// Identity API wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WireUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl From<WireUser> for Identity {
    fn from(user: WireUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name: user.user_metadata.name,
            phone: user.user_metadata.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: WireUser,
}

impl WireSession {
    /// A lifetime that does not fit a timestamp leaves the session already
    /// expired, so the next request refreshes it.
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                Duration::try_seconds(self.expires_in)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
            })
            .unwrap_or(now);
        AuthSession {
            identity: self.user.into(),
            access_token: AccessToken::new(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
        }
    }
}

/// Sign-up answers with a session when accounts are auto-confirmed and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSignUp {
    Session(WireSession),
    User(WireUser),
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a UserMetadata,
}

#[derive(Serialize)]
struct MetadataBody<'a> {
    data: &'a UserMetadata,
}

impl AuthGateway for BackendClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, GatewayError> {
        let mut url = self.auth_endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let builder = self
            .request(Method::POST, url, None)
            .json(&PasswordGrant { email, password });
        let session: WireSession = self.send_json(builder).await?;
        Ok(session.into_session(Utc::now()))
    }

    #[instrument(skip(self, password, metadata))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome, GatewayError> {
        let url = self.auth_endpoint("signup")?;
        let builder = self.request(Method::POST, url, None).json(&SignUpBody {
            email,
            password,
            data: metadata,
        });
        let outcome = match self.send_json::<WireSignUp>(builder).await? {
            WireSignUp::Session(session) => {
                let session = session.into_session(Utc::now());
                SignUpOutcome {
                    identity: session.identity.clone(),
                    session: Some(session),
                }
            }
            WireSignUp::User(user) => SignUpOutcome {
                identity: user.into(),
                session: None,
            },
        };
        Ok(outcome)
    }

    #[instrument(skip_all)]
    async fn update_profile_metadata(
        &self,
        token: &AccessToken,
        metadata: &UserMetadata,
    ) -> Result<Identity, GatewayError> {
        let url = self.auth_endpoint("user")?;
        let builder = self
            .request(Method::PUT, url, Some(token))
            .json(&MetadataBody { data: metadata });
        let user: WireUser = self.send_json(builder).await?;
        Ok(user.into())
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let url = self.auth_endpoint("logout")?;
        self.send(self.request(Method::POST, url, Some(token)))
            .await
            .map(|_| ())
    }

    #[instrument(skip_all)]
    async fn get_user(&self, token: &AccessToken) -> Result<Identity, GatewayError> {
        let url = self.auth_endpoint("user")?;
        let user: WireUser = self
            .send_json(self.request(Method::GET, url, Some(token)))
            .await?;
        Ok(user.into())
    }

    #[instrument(skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let mut url = self.auth_endpoint("token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");
        let builder = self.request(Method::POST, url, None).json(&RefreshGrant {
            refresh_token: refresh_token.expose_secret(),
        });
        let session: WireSession = self.send_json(builder).await?;
        Ok(session.into_session(Utc::now()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn with_trailing_slash(url: &str) -> Result<Url, url::ParseError> {
    if url.ends_with('/') {
        Url::parse(url)
    } else {
        Url::parse(&format!("{url}/"))
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Pull a human-readable message out of an error body.
///
/// The data API answers `{message, code, details, hint}`; the identity API
/// uses `error_description`, `msg` or `error`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| truncate(body))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;

    fn client(url: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: url.to_string(),
            anon_key: SecretString::from("anon-key"),
            request_timeout: Some(StdDuration::from_secs(5)),
        })
        .unwrap()
    }

    #[test]
    fn test_urls_join_with_or_without_trailing_slash() {
        for base in ["https://project.backend.test", "https://project.backend.test/"] {
            let client = client(base);
            let url = client
                .table_url(Table::CartItems, &Query::new().eq("user_id", "u1").params())
                .unwrap();
            assert_eq!(
                url.as_str(),
                "https://project.backend.test/rest/v1/cart_items?select=*&user_id=eq.u1"
            );
            assert_eq!(
                client.auth_endpoint("signup").unwrap().as_str(),
                "https://project.backend.test/auth/v1/signup"
            );
        }
    }

    #[test]
    fn test_in_filter_is_percent_encoded() {
        let url = client("https://project.backend.test")
            .table_url(
                Table::Products,
                &Query::new().in_list("id", ["a", "b"]).filter_params(),
            )
            .unwrap();
        assert_eq!(url.query(), Some("id=in.%28%22a%22%2C%22b%22%29"));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"message":"violates row-level security","code":"42501"}"#),
            "violates row-level security"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_wire_session_prefers_absolute_expiry() {
        let json = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "user": {
                "id": "7f1c2a9e-0000-4000-8000-000000000002",
                "email": "ana@example.com",
                "user_metadata": {"name": "Ana", "phone": "11987654321"}
            }
        });
        let wire: WireSession = serde_json::from_value(json).unwrap();
        let session = wire.into_session(Utc::now());

        assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
        assert_eq!(session.identity.name.as_deref(), Some("Ana"));
        assert_eq!(session.identity.phone.as_deref(), Some("11987654321"));
    }

    #[test]
    fn test_out_of_range_lifetime_yields_expired_session() {
        let now = Utc::now();
        for expires_in in [i64::MAX, i64::MIN, 9_000_000_000_000_000] {
            let json = serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": expires_in,
                "user": {"id": "7f1c2a9e-0000-4000-8000-000000000002"}
            });
            let wire: WireSession = serde_json::from_value(json).unwrap();
            let session = wire.into_session(now);
            assert!(session.is_expired(now), "{expires_in}");
        }
    }

    #[test]
    fn test_relative_lifetime_is_added_to_now() {
        let now = Utc::now();
        let json = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "7f1c2a9e-0000-4000-8000-000000000002"}
        });
        let wire: WireSession = serde_json::from_value(json).unwrap();
        assert_eq!(wire.into_session(now).expires_at, now + Duration::hours(1));
    }

    #[test]
    fn test_sign_up_body_without_session_reads_as_user() {
        let json = serde_json::json!({
            "id": "7f1c2a9e-0000-4000-8000-000000000002",
            "email": "ana@example.com",
            "user_metadata": {}
        });
        let parsed: WireSignUp = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed, WireSignUp::User(_)));
    }
}
