//! Tests for the Reconciler: fallback, merge, provenance, deduplication.

use std::sync::Arc;
use std::time::Duration;

use idmesh::adapter::{DurableStore, VolatileStore};
use idmesh::{Reconciler, Role, ShopStatus, StoreAdapter, StoreKind};

use crate::helpers::*;

#[tokio::test]
async fn unknown_email_is_not_found() {
    let reconciler = Reconciler::new(vec![volatile()]);
    let err = reconciler.get_by_email("ghost@x.com").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn volatile_fallback_when_durable_is_down() {
    let durable = Flaky::new(DurableStore::in_memory().await.unwrap());
    let vol = volatile();
    vol.create(record("a@x.com", None)).await.unwrap();

    durable.set_down(true);
    let reconciler = Reconciler::new(vec![durable.clone(), vol]);

    let resolved = reconciler.get_by_email("a@x.com").await.unwrap();
    assert_eq!(resolved.record.email, "a@x.com");
    assert_eq!(resolved.provenance, vec![StoreKind::Volatile]);
    assert!(!resolved.is_durably_backed());
}

#[tokio::test]
async fn local_file_fallback_then_escalation_is_visible() {
    // Durable unavailable, volatile empty, local file holds a@x.com as USER.
    let durable = Flaky::new(DurableStore::in_memory().await.unwrap());
    durable.set_down(true);
    let vol = volatile();
    let (local, _dir) = local_file();
    let seeded = local.create(record("a@x.com", Some(Role::User))).await.unwrap();

    let reconciler = Reconciler::new(vec![durable, vol, local.clone()]);

    let resolved = reconciler.get_by_email("a@x.com").await.unwrap();
    assert_eq!(resolved.record.effective_role(), Role::User);
    assert_eq!(resolved.provenance, vec![StoreKind::LocalFile]);

    // Promote in the only reachable store; the next read reflects it.
    local
        .update(&seeded.id, &idmesh::IdentityPatch::role(Role::Admin))
        .await
        .unwrap();
    let resolved = reconciler.get_by_email("a@x.com").await.unwrap();
    assert_eq!(resolved.record.effective_role(), Role::Admin);
}

#[tokio::test]
async fn resolved_role_rank_is_at_least_every_store_rank() {
    let durable = durable().await;
    let vol = volatile();
    let (local, _dir) = local_file();

    durable.create(record("a@x.com", Some(Role::User))).await.unwrap();
    vol.create(record("a@x.com", Some(Role::SuperAdmin))).await.unwrap();
    local.create(record("a@x.com", Some(Role::Admin))).await.unwrap();

    let adapters: Vec<Arc<dyn StoreAdapter>> = vec![durable, vol, local];
    let reconciler = Reconciler::new(adapters.clone());
    let resolved = reconciler.get_by_email("a@x.com").await.unwrap();

    for adapter in &adapters {
        let held = adapter.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(resolved.record.effective_role() >= held.effective_role());
    }
    assert_eq!(resolved.record.effective_role(), Role::SuperAdmin);
    assert_eq!(
        resolved.provenance,
        vec![StoreKind::Durable, StoreKind::Volatile, StoreKind::LocalFile]
    );
    // Independent per-store creates minted independent ids.
    assert!(resolved.divergent);
}

#[tokio::test]
async fn canonical_fields_prefer_the_durable_store() {
    let durable = durable().await;
    let vol = volatile();

    let mut in_durable = record("a@x.com", None);
    in_durable.name = "Durable Name".to_string();
    let in_durable = durable.create(in_durable).await.unwrap();

    let mut in_volatile = record("a@x.com", Some(Role::Admin));
    in_volatile.name = "Volatile Name".to_string();
    vol.create(in_volatile).await.unwrap();

    let reconciler = Reconciler::new(vec![durable, vol]);
    let resolved = reconciler.get_by_email("a@x.com").await.unwrap();

    // Non-role fields and the canonical id come from the durable store; the
    // role overlay still reflects the most privileged candidate.
    assert_eq!(resolved.record.name, "Durable Name");
    assert_eq!(resolved.record.id, in_durable.id);
    assert_eq!(resolved.record.effective_role(), Role::Admin);
    assert!(resolved.divergent);
}

#[tokio::test]
async fn slow_store_degrades_instead_of_blocking() {
    let slow = Slow::new(
        DurableStore::in_memory().await.unwrap(),
        Duration::from_secs(5),
    );
    let vol = volatile();
    vol.create(record("a@x.com", None)).await.unwrap();

    let reconciler = Reconciler::with_timeout(vec![slow, vol], Duration::from_millis(50));
    let resolved = reconciler.get_by_email("a@x.com").await.unwrap();
    assert_eq!(resolved.provenance, vec![StoreKind::Volatile]);
}

#[tokio::test]
async fn list_all_deduplicates_by_email() {
    let durable = durable().await;
    let vol = volatile();

    durable.create(record("a@x.com", None)).await.unwrap();
    durable.create(record("b@x.com", None)).await.unwrap();
    vol.create(record("a@x.com", Some(Role::Admin))).await.unwrap();
    vol.create(record("c@x.com", None)).await.unwrap();

    let reconciler = Reconciler::new(vec![durable, vol]);
    let all = reconciler.list_all().await.unwrap();

    // Four raw rows, three identities, sorted by email.
    let emails: Vec<&str> = all.iter().map(|r| r.record.email.as_str()).collect();
    assert_eq!(emails, vec!["a@x.com", "b@x.com", "c@x.com"]);

    let a = &all[0];
    assert_eq!(a.record.effective_role(), Role::Admin);
    assert_eq!(a.provenance, vec![StoreKind::Durable, StoreKind::Volatile]);
}

#[tokio::test]
async fn list_all_skips_unreachable_stores() {
    let durable = Flaky::new(DurableStore::in_memory().await.unwrap());
    durable.create(record("a@x.com", None)).await.unwrap();
    let vol = volatile();
    vol.create(record("b@x.com", None)).await.unwrap();

    durable.set_down(true);
    let reconciler = Reconciler::new(vec![durable, vol]);
    let all = reconciler.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.email, "b@x.com");
}

#[tokio::test]
async fn pending_status_never_survives_a_decided_application() {
    let durable = durable().await;
    let vol = volatile();

    // The durable store lags with Pending; the volatile store already saw
    // the approval.
    durable
        .create(shop_record("shop@x.com", ShopStatus::Pending))
        .await
        .unwrap();
    vol.create(shop_record("shop@x.com", ShopStatus::Approved))
        .await
        .unwrap();

    let reconciler = Reconciler::new(vec![durable, vol]);
    let resolved = reconciler.get_by_email("shop@x.com").await.unwrap();
    let info = resolved.record.shop_info.expect("shop info kept");
    assert_eq!(info.status, ShopStatus::Approved);
}
