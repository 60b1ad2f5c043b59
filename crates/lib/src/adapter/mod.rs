//! Storage adapters for the backing stores.
//!
//! This module provides the [`StoreAdapter`] trait and one implementation per
//! backing store. The trait lets the reconcile and write paths treat the
//! durable SQL database, the process-local memory store, and the local JSON
//! file uniformly: callers compose a priority-ordered list of adapter
//! instances and never branch on which concrete backend is in use.
//!
//! Any adapter call may fail with [`AdapterError::Unavailable`]. That is a
//! recoverable, expected condition: the store is skipped for the current
//! operation, never turned into a request failure.

use async_trait::async_trait;

use crate::Result;
use crate::record::{IdentityPatch, IdentityRecord};

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod durable;
mod errors;
pub mod local_file;
pub mod volatile;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use durable::DurableStore;
pub use errors::AdapterError;
pub use local_file::LocalFileStore;
pub use volatile::VolatileStore;

/// Identifies which backing store an adapter fronts.
///
/// Carried in provenance sets and per-adapter write outcomes so operators can
/// tell whether a record is durable or only volatile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Network-backed SQL store. Source of truth when reachable.
    Durable,
    /// Process-local in-memory store. Lost on restart.
    Volatile,
    /// Disk-persisted JSON store. Enabled only outside production.
    LocalFile,
}

impl StoreKind {
    /// Static precedence used everywhere a single store must win:
    /// Durable > Volatile > LocalFile. Higher is stronger.
    pub fn priority(self) -> u8 {
        match self {
            StoreKind::Durable => 2,
            StoreKind::Volatile => 1,
            StoreKind::LocalFile => 0,
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Durable => write!(f, "durable"),
            StoreKind::Volatile => write!(f, "volatile"),
            StoreKind::LocalFile => write!(f, "local-file"),
        }
    }
}

/// Uniform lookup/write primitive over one backing store.
///
/// Implementations handle the specifics of how records are persisted (SQL
/// rows, an in-memory map, a JSON file). All of them must be `Send + Sync`
/// so a single adapter list can serve arbitrarily many concurrent requests.
///
/// Contract notes:
/// - `email` lookups are case-sensitive exact matches on the natural key.
/// - Ids are local to the adapter that minted the row; `find_by_id` on a
///   sibling adapter legitimately returns `None` for the same person.
/// - Every method may return [`AdapterError::Unavailable`]; callers must
///   degrade to "no data from this store" rather than propagate a failure.
/// - No adapter retries internally here. Retry-with-backoff, if desired,
///   belongs to an individual transport and must not block sibling stores.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Which backing store this adapter fronts.
    fn kind(&self) -> StoreKind;

    /// Look up a record by its email (exact match).
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>>;

    /// Look up a record by this store's own id.
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>>;

    /// Persist a fully materialized record.
    ///
    /// Fails with [`AdapterError::EmailTaken`] when this store already holds
    /// a record for the email.
    async fn create(&self, record: IdentityRecord) -> Result<IdentityRecord>;

    /// Apply a patch to the record with the given id.
    ///
    /// Returns the updated record, or `None` when this store has no such id.
    async fn update(&self, id: &str, patch: &IdentityPatch) -> Result<Option<IdentityRecord>>;

    /// Remove the record with the given id. Returns whether a row existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// All records this store currently holds, in unspecified order.
    async fn list_all(&self) -> Result<Vec<IdentityRecord>>;
}
