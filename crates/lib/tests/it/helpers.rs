use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use idmesh::adapter::{AdapterError, DurableStore, LocalFileStore, VolatileStore};
use idmesh::{
    IdentityPatch, IdentityRecord, NewIdentity, Role, ShopInfo, ShopStatus, StoreAdapter,
    StoreKind, UserType,
};

/// Fresh volatile store.
pub fn volatile() -> Arc<VolatileStore> {
    Arc::new(VolatileStore::new())
}

/// Local-file store in a fresh temp directory. The tempdir handle must be
/// kept alive for the duration of the test.
pub fn local_file() -> (Arc<LocalFileStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Arc::new(LocalFileStore::new(dir.path().join("identities.json")));
    (store, dir)
}

/// In-memory SQLite durable store.
pub async fn durable() -> Arc<DurableStore> {
    Arc::new(
        DurableStore::in_memory()
            .await
            .expect("Failed to create SQLite store"),
    )
}

/// New-identity input for a plain customer.
pub fn new_identity(email: &str) -> NewIdentity {
    NewIdentity {
        email: email.to_string(),
        name: format!("User {email}"),
        password_hash: "$argon2id$v=19$opaque".to_string(),
        phone: None,
        user_type: UserType::Customer,
        role: None,
        shop_info: None,
    }
}

/// Fully materialized record, as an adapter would hold it.
pub fn record(email: &str, role: Option<Role>) -> IdentityRecord {
    let mut new = new_identity(email);
    new.role = role;
    new.into_record(Utc::now())
}

/// Shop-owner record with the given application status.
pub fn shop_record(email: &str, status: ShopStatus) -> IdentityRecord {
    let mut new = new_identity(email);
    new.user_type = UserType::ShopOwner;
    new.shop_info = Some(ShopInfo {
        shop_name: format!("Shop of {email}"),
        business_number: "123-45-67890".to_string(),
        address: "1 Main St".to_string(),
        status,
        created_at: Utc::now(),
    });
    new.into_record(Utc::now())
}

/// Wrapper adapter that can be flipped to unavailable at runtime.
///
/// Stands in for a store whose transport is down: every call fails with
/// `AdapterError::Unavailable` while the flag is set, and recovers when it
/// is cleared.
pub struct Flaky<A> {
    inner: A,
    down: AtomicBool,
}

impl<A> Flaky<A> {
    pub fn new(inner: A) -> Arc<Self> {
        Arc::new(Self {
            inner,
            down: AtomicBool::new(false),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self, kind: StoreKind) -> idmesh::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(AdapterError::unavailable(kind, "transport down (test)").into())
        } else {
            Ok(())
        }
    }
}

/// Wrapper adapter that stalls every call by a fixed delay.
///
/// Used to prove a slow store degrades to unavailable for the call instead
/// of blocking its siblings.
pub struct Slow<A> {
    inner: A,
    delay: std::time::Duration,
}

impl<A> Slow<A> {
    pub fn new(inner: A, delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self { inner, delay })
    }
}

#[async_trait]
impl<A: StoreAdapter> StoreAdapter for Slow<A> {
    fn kind(&self) -> StoreKind {
        self.inner.kind()
    }

    async fn find_by_email(&self, email: &str) -> idmesh::Result<Option<IdentityRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: &str) -> idmesh::Result<Option<IdentityRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(id).await
    }

    async fn create(&self, record: IdentityRecord) -> idmesh::Result<IdentityRecord> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(record).await
    }

    async fn update(
        &self,
        id: &str,
        patch: &IdentityPatch,
    ) -> idmesh::Result<Option<IdentityRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> idmesh::Result<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> idmesh::Result<Vec<IdentityRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_all().await
    }
}

#[async_trait]
impl<A: StoreAdapter> StoreAdapter for Flaky<A> {
    fn kind(&self) -> StoreKind {
        self.inner.kind()
    }

    async fn find_by_email(&self, email: &str) -> idmesh::Result<Option<IdentityRecord>> {
        self.check(self.kind())?;
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: &str) -> idmesh::Result<Option<IdentityRecord>> {
        self.check(self.kind())?;
        self.inner.find_by_id(id).await
    }

    async fn create(&self, record: IdentityRecord) -> idmesh::Result<IdentityRecord> {
        self.check(self.kind())?;
        self.inner.create(record).await
    }

    async fn update(
        &self,
        id: &str,
        patch: &IdentityPatch,
    ) -> idmesh::Result<Option<IdentityRecord>> {
        self.check(self.kind())?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> idmesh::Result<bool> {
        self.check(self.kind())?;
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> idmesh::Result<Vec<IdentityRecord>> {
        self.check(self.kind())?;
        self.inner.list_all().await
    }
}
