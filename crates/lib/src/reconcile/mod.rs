//! Reconciliation of divergent per-store identity views.
//!
//! The [`Reconciler`] queries every configured adapter for a key, drops the
//! ones that are unreachable or miss their deadline, and merges whatever came
//! back into one canonical record. Merging is deliberately simple and
//! explicit:
//!
//! - non-role fields are taken wholesale from the highest-priority store that
//!   holds a record (Durable > Volatile > LocalFile);
//! - the `role` overlay is resolved most-privileged-wins by [`resolver`];
//! - a shop approval status never regresses to `Pending` when a lagging store
//!   still shows the application as open;
//! - divergent per-store ids set the `divergent` flag and log a consistency
//!   warning. Adapters do not share an id namespace, so divergence is a
//!   tolerated state, not an error.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::Result;
use crate::adapter::{StoreAdapter, StoreKind};
use crate::record::IdentityRecord;

mod errors;
pub mod resolver;

pub use errors::ReconcileError;

/// Default per-adapter deadline for reconciled reads.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(2);

/// One canonical identity, with the evidence it was built from.
#[derive(Clone, Debug)]
pub struct ResolvedIdentity {
    /// The merged canonical record.
    pub record: IdentityRecord,
    /// Stores that held a record for this email, in priority order.
    pub provenance: Vec<StoreKind>,
    /// True when the contributing stores disagree on the record id.
    pub divergent: bool,
}

impl ResolvedIdentity {
    /// Whether the canonical record is backed by the durable store.
    pub fn is_durably_backed(&self) -> bool {
        self.provenance.contains(&StoreKind::Durable)
    }
}

/// Merges per-store views into one canonical record per email.
///
/// Holds shared adapter handles; the same list is typically shared with the
/// write coordinator. Cheap to clone.
#[derive(Clone)]
pub struct Reconciler {
    adapters: Vec<Arc<dyn StoreAdapter>>,
    timeout: Duration,
}

impl Reconciler {
    /// Create a reconciler over the given adapters with the default
    /// per-adapter timeout.
    ///
    /// The list is re-sorted by store priority so merge precedence never
    /// depends on construction order.
    pub fn new(adapters: Vec<Arc<dyn StoreAdapter>>) -> Self {
        Self::with_timeout(adapters, DEFAULT_ADAPTER_TIMEOUT)
    }

    /// Create a reconciler with an explicit per-adapter timeout.
    pub fn with_timeout(mut adapters: Vec<Arc<dyn StoreAdapter>>, timeout: Duration) -> Self {
        adapters.sort_by_key(|a| std::cmp::Reverse(a.kind().priority()));
        Self { adapters, timeout }
    }

    /// The configured adapters, priority-ordered.
    pub fn adapters(&self) -> &[Arc<dyn StoreAdapter>] {
        &self.adapters
    }

    /// Resolve the canonical record for an email.
    ///
    /// Queries every adapter concurrently, each bounded by the per-adapter
    /// timeout. Unreachable or slow stores are degraded to "no data" for
    /// this call only. Zero hits across all stores is
    /// [`ReconcileError::IdentityNotFound`].
    pub async fn get_by_email(&self, email: &str) -> Result<ResolvedIdentity> {
        if self.adapters.is_empty() {
            return Err(ReconcileError::NoAdaptersConfigured.into());
        }

        let mut set = JoinSet::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let email = email.to_string();
            let timeout = self.timeout;
            set.spawn(async move {
                let kind = adapter.kind();
                let outcome =
                    tokio::time::timeout(timeout, adapter.find_by_email(&email)).await;
                (kind, outcome)
            });
        }

        let mut candidates = Vec::new();
        while let Some(join_result) = set.join_next().await {
            let Ok((kind, outcome)) = join_result else {
                continue;
            };
            match outcome {
                Ok(Ok(Some(record))) => candidates.push((kind, record)),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    debug!(store = %kind, error = %err, "store dropped from reconciliation");
                }
                Err(_) => {
                    warn!(store = %kind, timeout_ms = self.timeout.as_millis() as u64,
                        "store missed its deadline, degraded to unavailable for this call");
                }
            }
        }

        if candidates.is_empty() {
            return Err(ReconcileError::IdentityNotFound {
                email: email.to_string(),
            }
            .into());
        }
        Ok(merge_candidates(candidates))
    }

    /// All known identities, deduplicated by email.
    ///
    /// Takes the union of every reachable store's records, buckets them by
    /// email, and applies the same merge rule per bucket as
    /// [`Reconciler::get_by_email`]. The count reflects deduplicated
    /// identities, not raw per-store row counts. Output is sorted by email
    /// for a stable order.
    pub async fn list_all(&self) -> Result<Vec<ResolvedIdentity>> {
        if self.adapters.is_empty() {
            return Err(ReconcileError::NoAdaptersConfigured.into());
        }

        let mut set = JoinSet::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let timeout = self.timeout;
            set.spawn(async move {
                let kind = adapter.kind();
                let outcome = tokio::time::timeout(timeout, adapter.list_all()).await;
                (kind, outcome)
            });
        }

        let mut buckets: std::collections::HashMap<String, Vec<(StoreKind, IdentityRecord)>> =
            std::collections::HashMap::new();
        while let Some(join_result) = set.join_next().await {
            let Ok((kind, outcome)) = join_result else {
                continue;
            };
            match outcome {
                Ok(Ok(records)) => {
                    for record in records {
                        buckets.entry(record.email.clone()).or_default().push((kind, record));
                    }
                }
                Ok(Err(err)) => {
                    debug!(store = %kind, error = %err, "store dropped from listing");
                }
                Err(_) => {
                    warn!(store = %kind, "store missed its deadline during listing");
                }
            }
        }

        let mut resolved: Vec<ResolvedIdentity> =
            buckets.into_values().map(merge_candidates).collect();
        resolved.sort_by(|a, b| a.record.email.cmp(&b.record.email));
        Ok(resolved)
    }
}

/// Merge candidate records sharing one email into the canonical view.
///
/// The canonical id comes from the highest-priority contributing store, which
/// makes it the durable store's id whenever the durable store holds the
/// record (the documented tie-break).
fn merge_candidates(mut candidates: Vec<(StoreKind, IdentityRecord)>) -> ResolvedIdentity {
    candidates.sort_by_key(|(kind, _)| std::cmp::Reverse(kind.priority()));

    let provenance: Vec<StoreKind> = candidates.iter().map(|(kind, _)| *kind).collect();
    let divergent = candidates
        .iter()
        .any(|(_, record)| record.id != candidates[0].1.id);

    // Non-role fields come wholesale from the highest-priority store.
    let mut record = candidates[0].1.clone();

    let role = resolver::effective_role(&candidates);
    if candidates.iter().any(|(_, c)| c.role.is_some()) {
        record.role = Some(role);
    }

    if let Some(status) = resolver::effective_shop_status(&candidates)
        && let Some(info) = record.shop_info.as_mut()
        && status.rank() > info.status.rank()
    {
        info.status = status;
    }

    if divergent {
        warn!(
            email = %record.email,
            canonical_id = %record.id,
            stores = ?provenance,
            "identity has divergent ids across stores; keeping highest-priority id"
        );
    }

    ResolvedIdentity {
        record,
        provenance,
        divergent,
    }
}
