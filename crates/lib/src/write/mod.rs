//! Best-effort multi-store write path.
//!
//! There is no shared transaction across the backing stores, so writes are
//! applied per store and reported per store. The [`WriteCoordinator`] walks
//! the adapter list in priority order, tolerates individual failures, and
//! returns a [`WriteReport`] naming exactly which stores took the write, so
//! callers can tell whether a record is durable or only volatile.
//!
//! There is no background repair job. Convergence, if it happens at all,
//! happens lazily when a later write reaches more stores.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::Result;
use crate::adapter::{StoreAdapter, StoreKind};
use crate::record::{IdentityPatch, IdentityRecord, NewIdentity};
use crate::reconcile::DEFAULT_ADAPTER_TIMEOUT;

mod errors;

pub use errors::WriteError;

/// Target of an update or delete.
///
/// Ids are store-local: an id only matches the store whose id-space produced
/// it. Email keys address the identity across every store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteKey {
    /// A store-local record id.
    Id(String),
    /// The cross-store natural key.
    Email(String),
}

impl std::fmt::Display for WriteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteKey::Id(id) => write!(f, "id:{id}"),
            WriteKey::Email(email) => write!(f, "email:{email}"),
        }
    }
}

/// What happened in one store during a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Create landed in this store.
    Persisted,
    /// Update applied in this store.
    Updated,
    /// Delete removed a row in this store.
    Deleted,
    /// This store holds no record for the key. Tolerated divergence.
    NotFound,
    /// The store failed or was unreachable.
    Failed(String),
}

impl WriteOutcome {
    /// Whether this outcome means the write landed in the store.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            WriteOutcome::Persisted | WriteOutcome::Updated | WriteOutcome::Deleted
        )
    }
}

/// How widely a write landed across the configured stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Persistence {
    /// Every store that should hold the record took the write.
    Full,
    /// At least one store took the write, at least one failed.
    Partial,
}

/// Per-store outcome report for one write operation.
#[derive(Clone, Debug)]
pub struct WriteReport {
    /// The record as written, when the operation produces one.
    pub record: Option<IdentityRecord>,
    /// Outcome per attempted store, in priority order.
    pub outcomes: Vec<(StoreKind, WriteOutcome)>,
    /// Whether the write landed everywhere it was attempted.
    pub persistence: Persistence,
}

impl WriteReport {
    fn from_outcomes(
        record: Option<IdentityRecord>,
        outcomes: Vec<(StoreKind, WriteOutcome)>,
    ) -> Self {
        // NotFound does not count against fullness: a store legitimately not
        // holding the record is divergence, not failure.
        let failed = outcomes
            .iter()
            .any(|(_, o)| matches!(o, WriteOutcome::Failed(_)));
        let persistence = if failed {
            Persistence::Partial
        } else {
            Persistence::Full
        };
        Self {
            record,
            outcomes,
            persistence,
        }
    }

    /// Stores where the write landed.
    pub fn persisted_in(&self) -> Vec<StoreKind> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_success())
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Whether the durable store took the write.
    pub fn is_durable(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(kind, o)| *kind == StoreKind::Durable && o.is_success())
    }
}

/// Applies create/update/delete best-effort across the configured stores.
///
/// Shares its adapter list with the reconciler; never promises
/// all-or-nothing. Cheap to clone.
#[derive(Clone)]
pub struct WriteCoordinator {
    adapters: Vec<Arc<dyn StoreAdapter>>,
    timeout: Duration,
}

impl WriteCoordinator {
    /// Create a coordinator over the given adapters with the default
    /// per-adapter timeout.
    pub fn new(adapters: Vec<Arc<dyn StoreAdapter>>) -> Self {
        Self::with_timeout(adapters, DEFAULT_ADAPTER_TIMEOUT)
    }

    /// Create a coordinator with an explicit per-adapter timeout.
    pub fn with_timeout(mut adapters: Vec<Arc<dyn StoreAdapter>>, timeout: Duration) -> Self {
        adapters.sort_by_key(|a| std::cmp::Reverse(a.kind().priority()));
        Self { adapters, timeout }
    }

    /// Create a new identity.
    ///
    /// One id and one set of timestamps are minted up front, then the record
    /// is offered to every configured store in priority order (best-effort
    /// replication, non-atomic). Succeeds as long as at least one store
    /// persisted it; [`WriteError::AllStoresFailed`] only when every store
    /// rejected the write.
    pub async fn create(&self, new: NewIdentity) -> Result<WriteReport> {
        if self.adapters.is_empty() {
            return Err(WriteError::NoAdaptersConfigured.into());
        }
        let record = new.into_record(chrono::Utc::now());

        let mut outcomes = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let kind = adapter.kind();
            let outcome =
                match tokio::time::timeout(self.timeout, adapter.create(record.clone())).await {
                    Ok(Ok(_)) => WriteOutcome::Persisted,
                    Ok(Err(err)) => {
                        debug!(store = %kind, error = %err, "create failed in store");
                        WriteOutcome::Failed(err.to_string())
                    }
                    Err(_) => WriteOutcome::Failed("store missed its deadline".to_string()),
                };
            outcomes.push((kind, outcome));
        }

        if !outcomes.iter().any(|(_, o)| o.is_success()) {
            return Err(WriteError::AllStoresFailed {
                operation: "create".to_string(),
            }
            .into());
        }
        let report = WriteReport::from_outcomes(Some(record), outcomes);
        info!(
            email = %report.record.as_ref().map(|r| r.email.as_str()).unwrap_or_default(),
            stores = ?report.persisted_in(),
            durable = report.is_durable(),
            "identity created"
        );
        Ok(report)
    }

    /// Apply a patch to an existing identity.
    ///
    /// An id key only matches the store whose id-space produced it; an email
    /// key addresses every store holding the identity. A patch touching
    /// `role` is always fanned out by email to every holder, so a reconciled
    /// read sees the escalation before the stores converge.
    pub async fn update(&self, key: WriteKey, patch: &IdentityPatch) -> Result<WriteReport> {
        if self.adapters.is_empty() {
            return Err(WriteError::NoAdaptersConfigured.into());
        }

        // Id-keyed role escalations must reach every store holding the
        // identity, and id spaces are independent, so re-resolve the email
        // from whichever store recognizes the id first.
        let key = if patch.touches_role()
            && let WriteKey::Id(id) = &key
            && let Some(record) = self.find_anywhere_by_id(id).await
        {
            WriteKey::Email(record.email)
        } else {
            key
        };

        let mut outcomes = Vec::with_capacity(self.adapters.len());
        let mut updated = None;
        for adapter in &self.adapters {
            let kind = adapter.kind();
            let outcome = match self.update_in(adapter, &key, patch).await {
                Ok(Some(record)) => {
                    updated.get_or_insert(record);
                    WriteOutcome::Updated
                }
                Ok(None) => WriteOutcome::NotFound,
                Err(err) => {
                    debug!(store = %kind, error = %err, "update failed in store");
                    WriteOutcome::Failed(err.to_string())
                }
            };
            outcomes.push((kind, outcome));
        }

        self.require_any_success(&key, "update", &outcomes)?;
        Ok(WriteReport::from_outcomes(updated, outcomes))
    }

    /// Delete an identity, best-effort across stores.
    ///
    /// Deletion is not cascaded: a record surviving in one store after
    /// deletion elsewhere is tolerated and will simply resurface on the next
    /// reconciled read until deleted there too.
    pub async fn delete(&self, key: WriteKey) -> Result<WriteReport> {
        if self.adapters.is_empty() {
            return Err(WriteError::NoAdaptersConfigured.into());
        }

        let mut outcomes = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let kind = adapter.kind();
            let outcome = match self.delete_in(adapter, &key).await {
                Ok(true) => WriteOutcome::Deleted,
                Ok(false) => WriteOutcome::NotFound,
                Err(err) => {
                    debug!(store = %kind, error = %err, "delete failed in store");
                    WriteOutcome::Failed(err.to_string())
                }
            };
            outcomes.push((kind, outcome));
        }

        self.require_any_success(&key, "delete", &outcomes)?;
        Ok(WriteReport::from_outcomes(None, outcomes))
    }

    /// Fail the operation when nothing succeeded anywhere: a clean miss is
    /// `TargetNotFound`, while "some store held it but every attempt failed"
    /// is a total write failure.
    fn require_any_success(
        &self,
        key: &WriteKey,
        operation: &str,
        outcomes: &[(StoreKind, WriteOutcome)],
    ) -> Result<()> {
        if outcomes.iter().any(|(_, o)| o.is_success()) {
            return Ok(());
        }
        if outcomes
            .iter()
            .all(|(_, o)| matches!(o, WriteOutcome::NotFound))
        {
            return Err(WriteError::TargetNotFound {
                key: key.to_string(),
            }
            .into());
        }
        Err(WriteError::AllStoresFailed {
            operation: operation.to_string(),
        }
        .into())
    }

    async fn update_in(
        &self,
        adapter: &Arc<dyn StoreAdapter>,
        key: &WriteKey,
        patch: &IdentityPatch,
    ) -> Result<Option<IdentityRecord>> {
        let op = async {
            let id = match key {
                WriteKey::Id(id) => Some(id.clone()),
                WriteKey::Email(email) => adapter
                    .find_by_email(email)
                    .await?
                    .map(|record| record.id),
            };
            match id {
                Some(id) => adapter.update(&id, patch).await,
                None => Ok(None),
            }
        };
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(crate::adapter::AdapterError::unavailable(
                adapter.kind(),
                "store missed its deadline",
            )
            .into()),
        }
    }

    async fn delete_in(&self, adapter: &Arc<dyn StoreAdapter>, key: &WriteKey) -> Result<bool> {
        let op = async {
            let id = match key {
                WriteKey::Id(id) => Some(id.clone()),
                WriteKey::Email(email) => adapter
                    .find_by_email(email)
                    .await?
                    .map(|record| record.id),
            };
            match id {
                Some(id) => adapter.delete(&id).await,
                None => Ok(false),
            }
        };
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(crate::adapter::AdapterError::unavailable(
                adapter.kind(),
                "store missed its deadline",
            )
            .into()),
        }
    }

    /// First record any reachable store recognizes for this id.
    async fn find_anywhere_by_id(&self, id: &str) -> Option<IdentityRecord> {
        for adapter in &self.adapters {
            match tokio::time::timeout(self.timeout, adapter.find_by_id(id)).await {
                Ok(Ok(Some(record))) => return Some(record),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    debug!(store = %adapter.kind(), error = %err, "id probe failed in store");
                }
                Err(_) => {
                    debug!(store = %adapter.kind(), "id probe missed its deadline");
                }
            }
        }
        None
    }
}
