//! In-memory stand-in for the hosted backend.
//!
//! Rows are kept as JSON objects per table and go through the same serde
//! paths as the real client. Tests can seed rows, inspect what was written,
//! count mutations and make specific operations fail.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use stg_catalog_core::UserId;

use super::{AuthGateway, Direction, Gateway, GatewayError, Query, SignUpOutcome, Table};
use crate::models::{AccessToken, AuthSession, Identity, UserMetadata};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct Store {
    tables: HashMap<Table, Vec<Value>>,
    failures: HashSet<(Table, Operation)>,
    mutations: usize,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
    auth_calls: usize,
    fail_sign_out: bool,
}

/// Backend double backed by process memory.
#[derive(Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add rows to `table` as-is.
    ///
    /// # Panics
    ///
    /// Panics if a row does not serialize to a JSON object.
    #[allow(clippy::expect_used)]
    pub fn seed<R: Serialize>(&self, table: Table, rows: impl IntoIterator<Item = R>) {
        let mut store = self.lock();
        let entries = store.tables.entry(table).or_default();
        for row in rows {
            let value = serde_json::to_value(row).expect("seed rows serialize to JSON");
            assert!(value.is_object(), "seed rows must be JSON objects");
            entries.push(value);
        }
    }

    /// Current rows of `table`, deserialized.
    ///
    /// # Panics
    ///
    /// Panics if a stored row does not match `T`.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn rows<T: DeserializeOwned>(&self, table: Table) -> Vec<T> {
        self.lock()
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .map(|row| serde_json::from_value(row.clone()).expect("stored row matches type"))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn count(&self, table: Table) -> usize {
        self.lock().tables.get(&table).map_or(0, Vec::len)
    }

    /// Number of insert, update and delete calls seen so far.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.lock().mutations
    }

    /// Number of identity API calls seen so far.
    #[must_use]
    pub fn auth_calls(&self) -> usize {
        self.lock().auth_calls
    }

    /// Make every `operation` on `table` fail until [`Self::heal`] is called.
    pub fn fail(&self, table: Table, operation: Operation) {
        self.lock().failures.insert((table, operation));
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        let mut store = self.lock();
        store.failures.clear();
        store.fail_sign_out = false;
    }

    /// Make sign-out fail remotely.
    pub fn fail_sign_out(&self) {
        self.lock().fail_sign_out = true;
    }

    /// Register an account that can sign in with `password`.
    pub fn register(&self, email: &str, password: &str, metadata: UserMetadata) -> Identity {
        let identity = Identity {
            id: UserId::generate(),
            email: email.to_string(),
            name: metadata.name,
            phone: metadata.phone,
        };
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    /// Issue a session for `identity` that expires `ttl` from now.
    ///
    /// A negative `ttl` yields an already expired session.
    #[must_use]
    pub fn issue_session(&self, identity: &Identity, ttl: Duration) -> AuthSession {
        let mut store = self.lock();
        issue(&mut store, identity.clone(), ttl)
    }

    /// Revoke a refresh token so refreshing with it fails.
    pub fn revoke_refresh(&self, refresh_token: &SecretString) {
        self.lock()
            .refresh_tokens
            .remove(refresh_token.expose_secret());
    }

    fn check(store: &Store, table: Table, operation: Operation) -> Result<(), GatewayError> {
        if store.failures.contains(&(table, operation)) {
            return Err(GatewayError::Api {
                status: 503,
                message: format!("injected {operation:?} failure on {table}"),
            });
        }
        Ok(())
    }
}

fn issue(store: &mut Store, identity: Identity, ttl: Duration) -> AuthSession {
    let access = Uuid::new_v4().to_string();
    let refresh = Uuid::new_v4().to_string();
    store.tokens.insert(access.clone(), identity.id);
    store.refresh_tokens.insert(refresh.clone(), identity.id);
    AuthSession {
        identity,
        access_token: AccessToken::new(access),
        refresh_token: SecretString::from(refresh),
        expires_at: Utc::now() + ttl,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query
        .filters()
        .iter()
        .all(|filter| filter.accepts(&text(row.get(filter.column()))))
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text(a).cmp(&text(b)),
    }
}

fn unauthorized() -> GatewayError {
    GatewayError::Api {
        status: 401,
        message: "invalid JWT".to_string(),
    }
}

impl Gateway for InMemoryBackend {
    async fn select<T>(
        &self,
        table: Table,
        query: &Query,
        _token: Option<&AccessToken>,
    ) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned + Send,
    {
        let mut rows: Vec<Value> = {
            let store = self.lock();
            Self::check(&store, table, Operation::Select)?;
            store
                .tables
                .get(&table)
                .map(|rows| rows.iter().filter(|row| matches(row, query)).cloned().collect())
                .unwrap_or_default()
        };

        if let Some((column, direction)) = query.order() {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(column), b.get(column));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
            .collect()
    }

    async fn insert<R, T>(
        &self,
        table: Table,
        rows: &[R],
        _token: Option<&AccessToken>,
    ) -> Result<Vec<T>, GatewayError>
    where
        R: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let mut object = match serde_json::to_value(row)? {
                Value::Object(object) => object,
                other => {
                    let mut object = Map::new();
                    object.insert("value".to_string(), other);
                    object
                }
            };
            object
                .entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            object.entry("created_at").or_insert_with(|| {
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
            });
            stored.push(Value::Object(object));
        }

        {
            let mut store = self.lock();
            store.mutations += 1;
            Self::check(&store, table, Operation::Insert)?;
            store
                .tables
                .entry(table)
                .or_default()
                .extend(stored.iter().cloned());
        }

        stored
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
            .collect()
    }

    async fn update<P>(
        &self,
        table: Table,
        query: &Query,
        patch: &P,
        _token: Option<&AccessToken>,
    ) -> Result<(), GatewayError>
    where
        P: Serialize + Sync,
    {
        let Value::Object(fields) = serde_json::to_value(patch)? else {
            return Err(GatewayError::Api {
                status: 400,
                message: "patch must be an object".to_string(),
            });
        };

        let mut store = self.lock();
        store.mutations += 1;
        Self::check(&store, table, Operation::Update)?;
        for row in store.tables.entry(table).or_default() {
            if matches(row, query)
                && let Value::Object(object) = row
            {
                for (key, value) in &fields {
                    object.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        table: Table,
        query: &Query,
        _token: Option<&AccessToken>,
    ) -> Result<(), GatewayError> {
        let mut store = self.lock();
        store.mutations += 1;
        Self::check(&store, table, Operation::Delete)?;
        store
            .tables
            .entry(table)
            .or_default()
            .retain(|row| !matches(row, query));
        Ok(())
    }
}

impl AuthGateway for InMemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, GatewayError> {
        let mut store = self.lock();
        store.auth_calls += 1;
        let identity = store
            .accounts
            .get(email)
            .filter(|account| account.password == password)
            .map(|account| account.identity.clone())
            .ok_or_else(|| GatewayError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;
        Ok(issue(&mut store, identity, Duration::hours(1)))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome, GatewayError> {
        {
            let mut store = self.lock();
            store.auth_calls += 1;
            if store.accounts.contains_key(email) {
                return Err(GatewayError::Api {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
        }
        let identity = self.register(email, password, metadata.clone());
        Ok(SignUpOutcome {
            identity,
            session: None,
        })
    }

    async fn update_profile_metadata(
        &self,
        token: &AccessToken,
        metadata: &UserMetadata,
    ) -> Result<Identity, GatewayError> {
        let mut store = self.lock();
        store.auth_calls += 1;
        let user_id = *store.tokens.get(token.expose()).ok_or_else(unauthorized)?;
        let account = store
            .accounts
            .values_mut()
            .find(|account| account.identity.id == user_id)
            .ok_or_else(unauthorized)?;
        account.identity.name.clone_from(&metadata.name);
        account.identity.phone.clone_from(&metadata.phone);
        Ok(account.identity.clone())
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let mut store = self.lock();
        store.auth_calls += 1;
        if store.fail_sign_out {
            return Err(GatewayError::Api {
                status: 503,
                message: "injected sign-out failure".to_string(),
            });
        }
        store.tokens.remove(token.expose());
        Ok(())
    }

    async fn get_user(&self, token: &AccessToken) -> Result<Identity, GatewayError> {
        let mut store = self.lock();
        store.auth_calls += 1;
        let user_id = *store.tokens.get(token.expose()).ok_or_else(unauthorized)?;
        store
            .accounts
            .values()
            .find(|account| account.identity.id == user_id)
            .map(|account| account.identity.clone())
            .ok_or_else(unauthorized)
    }

    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let mut store = self.lock();
        store.auth_calls += 1;
        let user_id = store
            .refresh_tokens
            .remove(refresh_token.expose_secret())
            .ok_or_else(|| GatewayError::Api {
                status: 400,
                message: "Invalid Refresh Token".to_string(),
            })?;
        let identity = store
            .accounts
            .values()
            .find(|account| account.identity.id == user_id)
            .map(|account| account.identity.clone())
            .ok_or_else(unauthorized)?;
        Ok(issue(&mut store, identity, Duration::hours(1)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_filters_and_order() {
        let backend = InMemoryBackend::new();
        backend.seed(
            Table::Orders,
            [
                json!({"id": "1", "user_id": "a", "created_at": "2026-01-01T00:00:00Z"}),
                json!({"id": "2", "user_id": "b", "created_at": "2026-02-01T00:00:00Z"}),
                json!({"id": "3", "user_id": "a", "created_at": "2026-03-01T00:00:00Z"}),
            ],
        );

        let rows: Vec<Value> = backend
            .select(
                Table::Orders,
                &Query::new()
                    .eq("user_id", "a")
                    .order_by("created_at", Direction::Desc),
                None,
            )
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["3", "1"]);
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let backend = InMemoryBackend::new();
        let row: Value = backend
            .insert_one(Table::CartItems, &json!({"quantity": 1}), None)
            .await
            .unwrap();
        assert!(row["id"].is_string());
        assert!(row["created_at"].is_string());
        assert_eq!(backend.count(Table::CartItems), 1);
        assert_eq!(backend.mutations(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let backend = InMemoryBackend::new();
        backend.seed(Table::CartItems, [json!({"id": "x", "quantity": 1, "note": "keep"})]);
        backend
            .update(Table::CartItems, &Query::new().eq("id", "x"), &json!({"quantity": 4}), None)
            .await
            .unwrap();
        let rows: Vec<Value> = backend.rows(Table::CartItems);
        assert_eq!(rows[0]["quantity"], 4);
        assert_eq!(rows[0]["note"], "keep");
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_rows_untouched() {
        let backend = InMemoryBackend::new();
        backend.seed(Table::CartItems, [json!({"id": "x"})]);
        backend.fail(Table::CartItems, Operation::Delete);

        let result = backend.delete(Table::CartItems, &Query::new(), None).await;
        assert!(matches!(result, Err(GatewayError::Api { status: 503, .. })));
        assert_eq!(backend.count(Table::CartItems), 1);

        backend.heal();
        backend.delete(Table::CartItems, &Query::new(), None).await.unwrap();
        assert_eq!(backend.count(Table::CartItems), 0);
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let backend = InMemoryBackend::new();
        backend.register("ana@example.com", "segredo1", UserMetadata::default());

        assert!(backend.sign_in_with_password("ana@example.com", "errada").await.is_err());
        let session = backend
            .sign_in_with_password("ana@example.com", "segredo1")
            .await
            .unwrap();
        let identity = backend.get_user(&session.access_token).await.unwrap();
        assert_eq!(identity.email, "ana@example.com");
    }
}
