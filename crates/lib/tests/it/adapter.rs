//! Tests for the StoreAdapter implementations.

use std::sync::Arc;

use idmesh::adapter::{DurableStore, LocalFileStore, VolatileStore};
use idmesh::{IdentityPatch, Role, StoreAdapter, StoreKind};

use crate::helpers::*;

#[test]
fn store_priority_order() {
    assert!(StoreKind::Durable.priority() > StoreKind::Volatile.priority());
    assert!(StoreKind::Volatile.priority() > StoreKind::LocalFile.priority());
}

#[tokio::test]
async fn volatile_basic_operations() {
    let store = VolatileStore::new();
    let created = store.create(record("a@x.com", None)).await.unwrap();

    let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);

    let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "a@x.com");

    // Email match is exact and case-sensitive.
    assert!(store.find_by_email("A@x.com").await.unwrap().is_none());

    let updated = store
        .update(&created.id, &IdentityPatch::role(Role::Admin))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.role, Some(Role::Admin));

    assert_eq!(store.list_all().await.unwrap().len(), 1);
    assert!(store.delete(&created.id).await.unwrap());
    assert!(!store.delete(&created.id).await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn volatile_rejects_duplicate_email() {
    let store = VolatileStore::new();
    store.create(record("a@x.com", None)).await.unwrap();
    let err = store.create(record("a@x.com", None)).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn volatile_concurrent_creates_for_one_email_are_serialized() {
    // Pinned policy: the write lock makes exactly one create win; the loser
    // gets a clean conflict instead of silently shadowing the winner.
    let store = Arc::new(VolatileStore::new());

    let a = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.create(record("race@x.com", None)).await })
    };
    let b = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.create(record("race@x.com", None)).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| r.as_ref().is_err_and(|e| e.is_conflict()))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn local_file_missing_file_reads_as_empty() {
    let (store, _dir) = local_file();
    assert!(store.list_all().await.unwrap().is_empty());
    assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn local_file_round_trip_and_reopen() {
    let (store, dir) = local_file();
    let created = store.create(record("a@x.com", Some(Role::Admin))).await.unwrap();
    store.create(record("b@x.com", None)).await.unwrap();

    // A second store over the same path sees the same records: the file is
    // the source of truth, not the instance.
    let reopened = LocalFileStore::new(store.path());
    let found = reopened.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(found.role, Some(Role::Admin));
    assert_eq!(reopened.list_all().await.unwrap().len(), 2);

    // The atomic rewrite leaves no temp file behind.
    assert!(!dir.path().join("identities.tmp").exists());
}

#[tokio::test]
async fn local_file_update_and_delete() {
    let (store, _dir) = local_file();
    let created = store.create(record("a@x.com", None)).await.unwrap();

    let updated = store
        .update(&created.id, &IdentityPatch::role(Role::SuperAdmin))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.role, Some(Role::SuperAdmin));
    assert!(store.update("no-such-id", &IdentityPatch::default()).await.unwrap().is_none());

    assert!(store.delete(&created.id).await.unwrap());
    assert!(!store.delete(&created.id).await.unwrap());
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn local_file_rejects_duplicate_email() {
    let (store, _dir) = local_file();
    store.create(record("a@x.com", None)).await.unwrap();
    let err = store.create(record("a@x.com", None)).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn durable_basic_operations() {
    let store = durable().await;
    let created = store.create(record("a@x.com", None)).await.unwrap();

    let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
    let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "a@x.com");
    assert!(store.find_by_id("no-such-id").await.unwrap().is_none());

    let updated = store
        .update(&created.id, &IdentityPatch::role(Role::Admin))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.role, Some(Role::Admin));

    // The patched record is what later lookups return.
    let again = store.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(again.role, Some(Role::Admin));

    assert_eq!(store.list_all().await.unwrap().len(), 1);
    assert!(store.delete(&created.id).await.unwrap());
    assert!(!store.delete(&created.id).await.unwrap());
}

#[tokio::test]
async fn durable_rejects_duplicate_email() {
    let store = durable().await;
    store.create(record("a@x.com", None)).await.unwrap();
    let err = store.create(record("a@x.com", None)).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn durable_connect_failure_is_unavailable() {
    let err = DurableStore::connect("sqlite:/definitely/missing/dir/idmesh.db")
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn flaky_wrapper_reports_unavailable() {
    let store = Flaky::new(VolatileStore::new());
    store.create(record("a@x.com", None)).await.unwrap();

    store.set_down(true);
    let err = store.find_by_email("a@x.com").await.unwrap_err();
    assert!(err.is_unavailable());

    // Recovery is per-call, nothing is poisoned.
    store.set_down(false);
    assert!(store.find_by_email("a@x.com").await.unwrap().is_some());
}
