//! Local-disk store adapter.
//!
//! Persists every record as a single UTF-8 JSON array. Each mutation rewrites
//! the whole file atomically (temp file in the same directory, then rename),
//! so readers never observe a half-written array. There is no streaming or
//! append format.
//!
//! This store is only enabled outside production execution contexts; see the
//! settings module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Result;
use crate::record::{IdentityPatch, IdentityRecord};

use super::{AdapterError, StoreAdapter, StoreKind};

/// JSON-file store holding all records as one ordered array.
///
/// Read-modify-write sequences within this process are serialized by an
/// internal async mutex; without it two concurrent updates would both load
/// the array, apply their change, and the later rewrite would drop the
/// earlier one. Cross-process coordination is out of scope, matching the
/// store's development-only role.
#[derive(Debug)]
pub struct LocalFileStore {
    path: PathBuf,
    /// Guards load -> mutate -> rewrite sequences.
    guard: Mutex<()>,
}

impl LocalFileStore {
    /// Creates a store persisting to `path`. The file is created lazily on
    /// the first mutation; a missing file reads as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<IdentityRecord>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| {
                    AdapterError::CorruptRecord {
                        kind: StoreKind::LocalFile,
                        source,
                    }
                    .into()
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => {
                Err(AdapterError::unavailable(StoreKind::LocalFile, err.to_string()).into())
            }
        }
    }

    /// Rewrite the whole array atomically: serialize to a sibling temp file,
    /// then rename over the target so a crash mid-write leaves the previous
    /// contents intact.
    async fn save(&self, records: &[IdentityRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("tmp");
        let io = async {
            tokio::fs::write(&tmp, json.as_bytes()).await?;
            tokio::fs::rename(&tmp, &self.path).await
        };
        io.await
            .map_err(|err| AdapterError::unavailable(StoreKind::LocalFile, err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StoreAdapter for LocalFileStore {
    fn kind(&self) -> StoreKind {
        StoreKind::LocalFile
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
        let _lock = self.guard.lock().await;
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.email == email))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        let _lock = self.guard.lock().await;
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }

    async fn create(&self, record: IdentityRecord) -> Result<IdentityRecord> {
        let _lock = self.guard.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|r| r.email == record.email) {
            return Err(AdapterError::EmailTaken {
                kind: StoreKind::LocalFile,
                email: record.email,
            }
            .into());
        }
        records.push(record.clone());
        self.save(&records).await?;
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &IdentityPatch) -> Result<Option<IdentityRecord>> {
        let _lock = self.guard.lock().await;
        let mut records = self.load().await?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        patch.apply(record, chrono::Utc::now());
        let updated = record.clone();
        self.save(&records).await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _lock = self.guard.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records).await?;
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<IdentityRecord>> {
        let _lock = self.guard.lock().await;
        self.load().await
    }
}
