//! Product cache protocol against a directory-backed store.
//!
//! Every test builds managers through [`Harness::manager`]; a second
//! manager over the same directory stands in for another page load.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use vexaparts_core::{NoticeKind, ProductId};
use vexaparts_integration_tests::{Harness, START, catalogue};
use vexaparts_storefront::cache::{DEFAULT_FRESHNESS_WINDOW_MS, LOAD_FAILED_NOTICE};
use vexaparts_storefront::storage::{KeyValueStore, keys, read_raw};
use vexaparts_storefront::{CachePhase, CacheState};

#[tokio::test]
async fn test_empty_store_fetches_and_persists() {
    let h = Harness::start().await;
    h.serve(catalogue(3), 1).await;
    let manager = h.manager();

    let products = manager.load().await;

    assert_eq!(products.len(), 3);
    assert_eq!(manager.phase(), CachePhase::SourceFetched);
    assert_eq!(
        read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
        Some(START.to_string())
    );
    assert!(h.dir.path().join("products.json").exists());
}

#[tokio::test]
async fn test_fresh_cache_is_reused_across_managers() {
    let h = Harness::start().await;
    h.serve(catalogue(3), 1).await;
    h.manager().load().await;

    h.clock.advance(DEFAULT_FRESHNESS_WINDOW_MS - 1);
    let second = h.manager();
    let products = second.load().await;

    assert_eq!(products.len(), 3);
    assert_eq!(second.phase(), CachePhase::CacheFresh);
}

#[tokio::test]
async fn test_cache_is_stale_at_exactly_the_window() {
    let h = Harness::start().await;
    h.serve(catalogue(3), 2).await;
    h.manager().load().await;

    h.clock.advance(DEFAULT_FRESHNESS_WINDOW_MS);
    let second = h.manager();
    second.load().await;

    assert_eq!(second.phase(), CachePhase::SourceFetched);
    assert_eq!(
        read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
        Some((START + DEFAULT_FRESHNESS_WINDOW_MS).to_string())
    );
}

#[tokio::test]
async fn test_admin_delete_survives_reload_and_expiry() {
    let h = Harness::start().await;
    h.serve(catalogue(6), 1).await;
    let manager = h.manager();
    let edited = manager
        .load()
        .await
        .into_iter()
        .filter(|p| p.id != ProductId::new(5))
        .collect::<Vec<_>>();

    manager.commit_admin_edits(edited).await.unwrap();

    h.clock.advance(DEFAULT_FRESHNESS_WINDOW_MS * 24);
    let later = h.manager();
    let products = later.load().await;

    assert_eq!(products.len(), 5);
    assert!(products.iter().all(|p| p.id != ProductId::new(5)));
    assert_eq!(later.phase(), CachePhase::AdminAuthoritative);
    assert!(read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await.is_none());
}

#[tokio::test]
async fn test_failed_fetch_on_empty_store_notifies_once() {
    let h = Harness::start().await;
    h.fail().await;
    let manager = h.manager();

    let products = manager.load().await;

    assert!(products.is_empty());
    assert_eq!(manager.phase(), CachePhase::ErrorFallback);
    assert_eq!(
        h.notifier.notices(),
        vec![(LOAD_FAILED_NOTICE.to_string(), NoticeKind::Error)]
    );
}

#[tokio::test]
async fn test_failed_fetch_falls_back_to_stale_products() {
    let h = Harness::start().await;
    h.serve(catalogue(2), 1).await;
    h.manager().load().await;
    h.server.reset().await;
    h.fail().await;

    h.clock.advance(DEFAULT_FRESHNESS_WINDOW_MS * 2);
    let second = h.manager();
    let products = second.load().await;

    assert_eq!(products.len(), 2);
    assert_eq!(second.phase(), CachePhase::ErrorFallback);
    assert_eq!(h.notifier.count(NoticeKind::Error), 0);
}

#[tokio::test]
async fn test_refresh_ignores_freshness() {
    let h = Harness::start().await;
    h.serve(catalogue(2), 1).await;
    let manager = h.manager();
    manager.load().await;
    h.server.reset().await;
    h.serve(catalogue(4), 1).await;

    h.clock.advance(1_000);
    let products = manager.refresh().await;

    assert_eq!(products.len(), 4);
    assert_eq!(
        read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
        Some((START + 1_000).to_string())
    );
}

#[tokio::test]
async fn test_reset_drops_admin_edits() {
    let h = Harness::start().await;
    h.serve(catalogue(3), 2).await;
    let manager = h.manager();
    let mut products = manager.load().await;
    products.truncate(1);
    manager.commit_admin_edits(products).await.unwrap();

    let restored = manager.reset_to_source().await;

    assert_eq!(restored.len(), 3);
    assert!(read_raw(h.store.as_ref(), keys::HAS_ADMIN_EDITS).await.is_none());
    assert!(read_raw(h.store.as_ref(), keys::ADMIN_PRODUCTS).await.is_none());
    assert!(matches!(
        h.manager().inspect().await,
        CacheState::ServerFresh { .. }
    ));
}

#[tokio::test]
async fn test_clear_all_removes_every_file() {
    let h = Harness::start().await;
    h.serve(catalogue(2), 1).await;
    let manager = h.manager();
    manager.load().await;
    h.store.set(keys::CART, "[]").await.unwrap();
    h.store.set(keys::ORDERS, "[]").await.unwrap();

    manager.clear_all().await.unwrap();

    for key in keys::ALL {
        assert!(h.store.get(key).await.unwrap().is_none(), "{key} left behind");
    }
    assert_eq!(manager.phase(), CachePhase::Uninitialized);
    assert!(manager.products().is_empty());
}

#[tokio::test]
async fn test_concurrent_loads_share_one_fetch() {
    let h = Harness::start().await;
    h.serve(catalogue(3), 1).await;
    let manager = h.manager();

    let (a, b) = tokio::join!(manager.load(), manager.load());

    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
}
