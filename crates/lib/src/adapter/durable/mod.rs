//! SQL-backed durable store adapter.
//!
//! The durable store is the network-backed source of truth when reachable.
//! It is implemented over sqlx's `AnyPool` so the same adapter serves both
//! SQLite (embedded, used by tests via [`DurableStore::in_memory`]) and
//! PostgreSQL deployments.
//!
//! Every sqlx failure maps to [`AdapterError::Unavailable`]: a broken
//! connection, a timeout, or a missing table all mean the same thing to the
//! reconcile and write paths: no data from this store for this call.

/// Schema definition and initialization.
pub mod schema;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::record::{IdentityPatch, IdentityRecord};

use super::{AdapterError, StoreAdapter, StoreKind};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Adds a method converting sqlx errors into [`AdapterError::Unavailable`]
/// with a context message, since transport-level SQL failures are all
/// "store unreachable" from the caller's point of view.
pub(crate) trait SqlxResultExt<T> {
    /// Convert a sqlx error to `AdapterError::Unavailable` with context.
    fn sql_unavailable(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_unavailable(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            AdapterError::unavailable(StoreKind::Durable, format!("{context}: {e}")).into()
        })
    }
}

/// SQL database dialect behind the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// Durable store over sqlx `AnyPool`.
///
/// Records are persisted as one row per identity with the full record as a
/// JSON column, plus indexed `id` and `email` columns for the two lookup
/// keys. The pool handles connection management and thread safety.
#[derive(Debug)]
pub struct DurableStore {
    pool: AnyPool,
    kind: DbKind,
}

impl DurableStore {
    /// Connect using a connection URL, dispatching on its scheme
    /// (`sqlite:` or `postgres:`).
    pub async fn connect(url: &str) -> Result<Self> {
        if url.starts_with("postgres") {
            Self::connect_postgres(url).await
        } else {
            Self::connect_sqlite(url).await
        }
    }

    /// Connect to a SQLite database (e.g. `sqlite:./idmesh.db`).
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        // min_connections(1) keeps one connection alive; for in-memory
        // SQLite the database vanishes when the last connection closes.
        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect(url)
            .await
            .sql_unavailable("Failed to connect to SQLite")?;
        let store = Self {
            pool,
            kind: DbKind::Sqlite,
        };
        schema::init(&store.pool).await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store, mainly for tests.
    ///
    /// Uses shared cache mode so all pool connections see the same database;
    /// without it each connection gets its own empty in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let url = format!("sqlite:file:idmesh_{id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }

    /// Connect to a PostgreSQL database.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .sql_unavailable("Failed to connect to PostgreSQL")?;
        let store = Self {
            pool,
            kind: DbKind::Postgres,
        };
        schema::init(&store.pool).await?;
        Ok(store)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind_db(&self) -> DbKind {
        self.kind
    }

    fn decode(json: &str) -> Result<IdentityRecord> {
        serde_json::from_str(json).map_err(|source| {
            AdapterError::CorruptRecord {
                kind: StoreKind::Durable,
                source,
            }
            .into()
        })
    }

    fn encode(record: &IdentityRecord) -> Result<String> {
        Ok(serde_json::to_string(record)?)
    }
}

#[async_trait]
impl StoreAdapter for DurableStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Durable
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT record_json FROM identities WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .sql_unavailable("Failed to look up identity by email")?;
        row.map(|(json,)| Self::decode(&json)).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT record_json FROM identities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .sql_unavailable("Failed to look up identity by id")?;
        row.map(|(json,)| Self::decode(&json)).transpose()
    }

    async fn create(&self, record: IdentityRecord) -> Result<IdentityRecord> {
        let json = Self::encode(&record)?;
        let result = sqlx::query("INSERT INTO identities (id, email, record_json) VALUES ($1, $2, $3)")
            .bind(&record.id)
            .bind(&record.email)
            .bind(&json)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(db_err))
                if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Err(AdapterError::EmailTaken {
                    kind: StoreKind::Durable,
                    email: record.email,
                }
                .into())
            }
            Err(e) => Err(AdapterError::unavailable(
                StoreKind::Durable,
                format!("Failed to insert identity: {e}"),
            )
            .into()),
        }
    }

    async fn update(&self, id: &str, patch: &IdentityPatch) -> Result<Option<IdentityRecord>> {
        // Patch semantics live in Rust, so read-modify-write the JSON column.
        // The UNIQUE email column stays in sync with the JSON payload.
        let Some(mut record) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut record, chrono::Utc::now());
        let json = Self::encode(&record)?;
        sqlx::query("UPDATE identities SET email = $1, record_json = $2 WHERE id = $3")
            .bind(&record.email)
            .bind(&json)
            .bind(id)
            .execute(&self.pool)
            .await
            .sql_unavailable("Failed to update identity")?;
        Ok(Some(record))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .sql_unavailable("Failed to delete identity")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<IdentityRecord>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT record_json FROM identities")
            .fetch_all(&self.pool)
            .await
            .sql_unavailable("Failed to list identities")?;
        rows.iter().map(|(json,)| Self::decode(json)).collect()
    }
}
