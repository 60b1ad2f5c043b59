//! Process-local in-memory store adapter.
//!
//! Suitable as a fast fallback when the durable store is unreachable and as
//! the default store in tests. Everything here is lost on process restart by
//! nature; that is the documented contract of the volatile store, not a bug.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::record::{IdentityPatch, IdentityRecord};

use super::{AdapterError, StoreAdapter, StoreKind};

/// In-memory store backed by a `HashMap` keyed by record id.
///
/// The map is shared process-wide mutable state reached by arbitrarily many
/// concurrent requests, so every read-modify-write sequence runs under the
/// internal `RwLock`. Two concurrent creates for one email are serialized by
/// the write lock; the loser gets [`AdapterError::EmailTaken`].
///
/// Instances are explicitly constructed and injected into the adapter list.
/// There is no module-level singleton; the store's lifecycle is whatever its
/// owner decides, and [`VolatileStore::clear`] exists as an explicit test
/// hook rather than an implicit reset.
#[derive(Debug, Default)]
pub struct VolatileStore {
    records: RwLock<HashMap<String, IdentityRecord>>,
}

impl VolatileStore {
    /// Creates a new, empty `VolatileStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop every record. Test hook only.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl StoreAdapter for VolatileStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Volatile
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
        let records = self.records.read().await;
        Ok(records.values().find(|r| r.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn create(&self, record: IdentityRecord) -> Result<IdentityRecord> {
        // Uniqueness check and insert must happen under one write lock,
        // otherwise two concurrent creates for the same email both pass the
        // check and the later insert silently shadows the earlier one.
        let mut records = self.records.write().await;
        if records.values().any(|r| r.email == record.email) {
            return Err(AdapterError::EmailTaken {
                kind: StoreKind::Volatile,
                email: record.email,
            }
            .into());
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &IdentityPatch) -> Result<Option<IdentityRecord>> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                patch.apply(record, chrono::Utc::now());
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        Ok(records.remove(id).is_some())
    }

    async fn list_all(&self) -> Result<Vec<IdentityRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}
