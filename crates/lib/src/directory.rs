//! The user-facing handle over the reconciled identity store.
//!
//! A [`Directory`] owns the adapter set built from [`Settings`] and wires the
//! read path ([`Reconciler`]) and write path ([`WriteCoordinator`]) over the
//! same priority-ordered stores. Collaborators (authentication,
//! authorization, the shop-approval workflow, request handlers) talk to this
//! handle and never to individual adapters.

use std::sync::Arc;

use tracing::{info, warn};

use crate::Result;
use crate::adapter::{LocalFileStore, StoreAdapter, StoreKind, VolatileStore};
use crate::reconcile::{Reconciler, ResolvedIdentity};
use crate::record::{IdentityPatch, NewIdentity, ShopStatus};
use crate::settings::Settings;
use crate::write::{WriteCoordinator, WriteKey, WriteReport};

/// Reconciled identity store over the configured adapter set.
#[derive(Clone)]
pub struct Directory {
    adapters: Vec<Arc<dyn StoreAdapter>>,
    reconciler: Reconciler,
    writer: WriteCoordinator,
}

impl Directory {
    /// Build the adapter set from settings and open the directory.
    ///
    /// The durable store is attempted first when a URL is configured. A
    /// failed connection permanently disables that one adapter for this
    /// process with a warning; configuration-level failures never abort
    /// the process, they narrow it. The volatile store always exists; the
    /// local-file store only outside production.
    pub async fn open(settings: Settings) -> Result<Self> {
        let mut adapters: Vec<Arc<dyn StoreAdapter>> = Vec::new();

        if let Some(url) = &settings.durable_url {
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            match crate::adapter::DurableStore::connect(url).await {
                Ok(store) => adapters.push(Arc::new(store)),
                Err(err) => {
                    warn!(error = %err, "durable store unreachable, disabled for this process");
                }
            }
            #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
            warn!(url = %url, "durable store configured but SQL support is compiled out");
        }

        adapters.push(Arc::new(VolatileStore::new()));

        if !settings.environment.is_production()
            && let Some(path) = &settings.local_file_path
        {
            adapters.push(Arc::new(LocalFileStore::new(path)));
        }

        let kinds: Vec<StoreKind> = adapters.iter().map(|a| a.kind()).collect();
        info!(environment = %settings.environment, stores = ?kinds, "directory opened");

        Ok(Self::from_adapters(adapters, settings.adapter_timeout))
    }

    /// Open a directory over an explicit adapter set.
    ///
    /// Used by tests and by embedders that construct their own stores.
    pub fn from_adapters(
        adapters: Vec<Arc<dyn StoreAdapter>>,
        timeout: std::time::Duration,
    ) -> Self {
        let reconciler = Reconciler::with_timeout(adapters.clone(), timeout);
        let writer = WriteCoordinator::with_timeout(adapters.clone(), timeout);
        Self {
            adapters,
            reconciler,
            writer,
        }
    }

    /// The configured store kinds, in priority order.
    pub fn store_kinds(&self) -> Vec<StoreKind> {
        let mut kinds: Vec<StoreKind> = self.adapters.iter().map(|a| a.kind()).collect();
        kinds.sort_by_key(|k| std::cmp::Reverse(k.priority()));
        kinds
    }

    /// The read path.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// The write path.
    pub fn writer(&self) -> &WriteCoordinator {
        &self.writer
    }

    /// Canonical record for an email, with provenance.
    pub async fn get_by_email(&self, email: &str) -> Result<ResolvedIdentity> {
        self.reconciler.get_by_email(email).await
    }

    /// All identities, deduplicated by email.
    pub async fn list_all(&self) -> Result<Vec<ResolvedIdentity>> {
        self.reconciler.list_all().await
    }

    /// Shop-owner identities whose application is still pending.
    ///
    /// The shop-approval workflow filters on this; the result is stable and
    /// deduplicated no matter which stores hold the records.
    pub async fn pending_shops(&self) -> Result<Vec<ResolvedIdentity>> {
        let all = self.reconciler.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|resolved| {
                resolved
                    .record
                    .shop_info
                    .as_ref()
                    .is_some_and(|info| info.status == ShopStatus::Pending)
            })
            .collect())
    }

    /// Create a new identity, best-effort across stores.
    pub async fn create(&self, new: NewIdentity) -> Result<WriteReport> {
        self.writer.create(new).await
    }

    /// Patch an existing identity.
    pub async fn update(&self, key: WriteKey, patch: &IdentityPatch) -> Result<WriteReport> {
        self.writer.update(key, patch).await
    }

    /// Delete an identity, best-effort across stores.
    pub async fn delete(&self, key: WriteKey) -> Result<WriteReport> {
        self.writer.delete(key).await
    }
}
