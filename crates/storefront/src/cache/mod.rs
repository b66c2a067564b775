//! Product cache manager.
//!
//! Decides which product list a session should use and keeps the local
//! store consistent with the most recent authoritative write.
//!
//! # Precedence
//!
//! 1. An admin-saved list (`hasAdminEdits == "true"`) is used verbatim, at
//!    any age
//! 2. A cached server list younger than the freshness window is used as-is
//! 3. Otherwise the source is fetched and persisted together with a fresh
//!    timestamp
//! 4. If that fetch fails the stored list (any age) is used; with nothing
//!    stored the session gets an empty list and one error notice
//!
//! # Concurrency
//!
//! All operations serialize on one async mutex. `load` and `refresh` calls
//! that queued behind an equivalent successful operation join its result
//! instead of repeating the work. A commit, reset or clear in between
//! invalidates the join.

mod clock;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use state::{CachePhase, CacheRecord, CacheState, DEFAULT_FRESHNESS_WINDOW_MS, Resolution};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument, warn};
use vexaparts_core::{NoticeKind, Product, ValidationError, validate_product_list};

use crate::notify::{Notifier, TracingNotifier};
use crate::source::{FetchError, ProductSource};
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// Notice shown when no product list could be produced at all.
pub const LOAD_FAILED_NOTICE: &str = "Kon producten niet laden. Probeer te verversen.";

/// Errors returned by the mutating cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The product list was rejected before anything was written.
    #[error("Invalid product list: {0}")]
    Validation(#[from] ValidationError),

    /// Writing to the local store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Shared handle to a session's product cache.
///
/// Cloning is cheap; all clones see the same in-memory list.
#[derive(Clone)]
pub struct ProductCacheManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn ProductSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    freshness_window_ms: i64,
    op: Mutex<()>,
    loads_completed: AtomicU64,
    refreshes_completed: AtomicU64,
    invalidations: AtomicU64,
    products: watch::Sender<Vec<Product>>,
    phase: watch::Sender<CachePhase>,
}

/// Builder for [`ProductCacheManager`].
pub struct ProductCacheManagerBuilder {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn ProductSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    freshness_window_ms: i64,
}

impl ProductCacheManagerBuilder {
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the freshness window (milliseconds).
    #[must_use]
    pub const fn freshness_window_ms(mut self, window: i64) -> Self {
        self.freshness_window_ms = window;
        self
    }

    #[must_use]
    pub fn build(self) -> ProductCacheManager {
        let (products, _) = watch::channel(Vec::new());
        let (phase, _) = watch::channel(CachePhase::Uninitialized);

        ProductCacheManager {
            inner: Arc::new(Inner {
                store: self.store,
                source: self.source,
                notifier: self.notifier,
                clock: self.clock,
                freshness_window_ms: self.freshness_window_ms,
                op: Mutex::new(()),
                loads_completed: AtomicU64::new(0),
                refreshes_completed: AtomicU64::new(0),
                invalidations: AtomicU64::new(0),
                products,
                phase,
            }),
        }
    }
}

impl ProductCacheManager {
    /// Start building a manager over a store and a source.
    ///
    /// Defaults: tracing notifier, system clock, one hour freshness window.
    #[must_use]
    pub fn builder(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn ProductSource>,
    ) -> ProductCacheManagerBuilder {
        ProductCacheManagerBuilder {
            store,
            source,
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
        }
    }

    /// The current in-memory product list.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner.products.borrow().clone()
    }

    /// Where the current in-memory list came from.
    #[must_use]
    pub fn phase(&self) -> CachePhase {
        *self.inner.phase.borrow()
    }

    /// Watch the in-memory product list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Product>> {
        self.inner.products.subscribe()
    }

    /// The local store backing this manager.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    /// The notifier used for user-visible outcomes.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// The clock used for freshness checks.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Classify what is currently persisted, without side effects.
    pub async fn inspect(&self) -> CacheState {
        CacheRecord::read(self.inner.store.as_ref())
            .await
            .classify(self.inner.clock.now_millis(), self.inner.freshness_window_ms)
    }

    /// Resolve the product list for this session.
    ///
    /// Never fails: an irrecoverable failure yields an empty list and one
    /// error notice.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Vec<Product> {
        let loads_seen = self.inner.loads_completed.load(Ordering::SeqCst);
        let refreshes_seen = self.inner.refreshes_completed.load(Ordering::SeqCst);
        let invalidations_seen = self.inner.invalidations.load(Ordering::SeqCst);
        let _guard = self.inner.op.lock().await;

        if self.inner.invalidations.load(Ordering::SeqCst) == invalidations_seen
            && (self.inner.loads_completed.load(Ordering::SeqCst) != loads_seen
                || self.inner.refreshes_completed.load(Ordering::SeqCst) != refreshes_seen)
        {
            debug!("Joining load completed while waiting");
            return self.products();
        }

        let now = self.inner.clock.now_millis();
        let state = CacheRecord::read(self.inner.store.as_ref())
            .await
            .classify(now, self.inner.freshness_window_ms);

        let products = match state.resolve() {
            Resolution::Use { products, phase } => {
                debug!(count = products.len(), ?phase, "Using stored products");
                self.publish(products.clone(), phase);
                products
            }
            Resolution::Fetch { fallback } => {
                if fallback.is_some() {
                    self.set_phase(CachePhase::CacheStale);
                }
                self.fetch_or_fall_back(now, fallback).await
            }
        };

        self.inner.loads_completed.fetch_add(1, Ordering::SeqCst);
        products
    }

    /// Fetch the source regardless of freshness or admin edits.
    ///
    /// On failure the previous in-memory list is returned and storage is
    /// left untouched. Only successful refreshes can be joined.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Vec<Product> {
        let refreshes_seen = self.inner.refreshes_completed.load(Ordering::SeqCst);
        let invalidations_seen = self.inner.invalidations.load(Ordering::SeqCst);
        let _guard = self.inner.op.lock().await;

        if self.inner.invalidations.load(Ordering::SeqCst) == invalidations_seen
            && self.inner.refreshes_completed.load(Ordering::SeqCst) != refreshes_seen
        {
            debug!("Joining refresh completed while waiting");
            return self.products();
        }

        match self.fetch_and_persist(self.inner.clock.now_millis()).await {
            Ok(products) => {
                self.inner.refreshes_completed.fetch_add(1, Ordering::SeqCst);
                products
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, keeping current products");
                self.products()
            }
        }
    }

    /// Persist an admin-edited list as the authoritative product list.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Validation`] without writing anything if a
    /// product is incomplete, has a non-positive price, or shares an id.
    /// Returns [`CacheError::Storage`] if the store rejects a write.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn commit_admin_edits(&self, products: Vec<Product>) -> Result<(), CacheError> {
        validate_product_list(&products)?;
        let _guard = self.inner.op.lock().await;
        self.invalidate_joins();

        // Flag last: a partial commit is neither fresh nor admin-authoritative.
        let store = self.inner.store.as_ref();
        write_json(store, keys::ADMIN_PRODUCTS, &products).await?;
        store.remove(keys::PRODUCTS_TIMESTAMP).await?;
        write_json(store, keys::PRODUCTS, &products).await?;
        store.set(keys::HAS_ADMIN_EDITS, "true").await?;

        info!("Admin edits committed");
        self.publish(products, CachePhase::AdminAuthoritative);
        Ok(())
    }

    /// Discard every persisted product list and fetch the source again.
    ///
    /// When the fetch fails the previous in-memory list stays in use, but
    /// it is no longer considered admin-authoritative.
    #[instrument(skip(self))]
    pub async fn reset_to_source(&self) -> Vec<Product> {
        let _guard = self.inner.op.lock().await;
        self.invalidate_joins();

        let store = self.inner.store.as_ref();
        for key in [
            keys::PRODUCTS,
            keys::ADMIN_PRODUCTS,
            keys::HAS_ADMIN_EDITS,
            keys::PRODUCTS_TIMESTAMP,
        ] {
            if let Err(e) = store.remove(key).await {
                warn!(key, error = %e, "Failed to remove key during reset");
            }
        }

        match self.fetch_and_persist(self.inner.clock.now_millis()).await {
            Ok(products) => {
                info!(count = products.len(), "Products reset to source");
                products
            }
            Err(e) => {
                warn!(error = %e, "Reset fetch failed, keeping current products");
                self.set_phase(CachePhase::ErrorFallback);
                self.products()
            }
        }
    }

    /// Remove every storefront key and forget the in-memory list.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; keys after it are still attempted.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        let _guard = self.inner.op.lock().await;
        self.invalidate_joins();

        let mut first_error = None;
        for key in keys::ALL {
            if let Err(e) = self.inner.store.remove(key).await {
                warn!(key, error = %e, "Failed to remove key");
                first_error.get_or_insert(e);
            }
        }

        self.publish(Vec::new(), CachePhase::Uninitialized);
        info!("Storage cleared");
        first_error.map_or(Ok(()), Err)
    }

    /// The admin working copy, if one was saved.
    pub async fn admin_working_copy(&self) -> Option<Vec<Product>> {
        read_json(self.inner.store.as_ref(), keys::ADMIN_PRODUCTS).await
    }

    async fn fetch_or_fall_back(&self, now: i64, fallback: Option<Vec<Product>>) -> Vec<Product> {
        match self.fetch_and_persist(now).await {
            Ok(products) => products,
            Err(e) => match fallback {
                Some(products) => {
                    warn!(error = %e, count = products.len(), "Fetch failed, using stored products");
                    self.publish(products.clone(), CachePhase::ErrorFallback);
                    products
                }
                None => {
                    error!(error = %e, "Fetch failed with nothing stored");
                    self.inner
                        .notifier
                        .notify(LOAD_FAILED_NOTICE, NoticeKind::Error);
                    self.publish(Vec::new(), CachePhase::ErrorFallback);
                    Vec::new()
                }
            },
        }
    }

    /// Fetch, persist as server-authoritative, and publish.
    ///
    /// A failed write is logged; the fetched list is still used. Writes stop
    /// at the first failure, ordered so the record left behind is either the
    /// previous one or a stale server list.
    async fn fetch_and_persist(&self, now: i64) -> Result<Vec<Product>, FetchError> {
        let products = self.inner.source.fetch().await?;

        let store = self.inner.store.as_ref();
        let persisted = async {
            store.remove(keys::PRODUCTS_TIMESTAMP).await?;
            store.set(keys::HAS_ADMIN_EDITS, "false").await?;
            write_json(store, keys::PRODUCTS, &products).await?;
            store.set(keys::PRODUCTS_TIMESTAMP, &now.to_string()).await
        }
        .await;
        if let Err(e) = persisted {
            warn!(error = %e, "Failed to persist fetched products");
        }

        debug!(count = products.len(), "Products fetched from source");
        self.publish(products.clone(), CachePhase::SourceFetched);
        Ok(products)
    }

    /// Waiting `load`/`refresh` calls must not join results from before
    /// this point.
    fn invalidate_joins(&self) {
        self.inner.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    fn publish(&self, products: Vec<Product>, phase: CachePhase) {
        self.inner.products.send_replace(products);
        self.set_phase(phase);
    }

    fn set_phase(&self, phase: CachePhase) {
        self.inner.phase.send_replace(phase);
        sentry::configure_scope(|scope| {
            scope.set_tag("cache.phase", format!("{phase:?}"));
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use vexaparts_core::ProductId;

    use super::*;
    use crate::notify::CollectingNotifier;
    use crate::storage::{MemoryStore, read_raw};

    const T0: i64 = 1_750_000_000_000;

    fn product(id: i64, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            category: None,
            price: Decimal::new(10_000, 2),
            image: format!("img/{id}.png"),
            description: None,
            amount: None,
            specifications: BTreeMap::new(),
        }
    }

    fn remote() -> Vec<Product> {
        vec![product(1, "Remote CPU"), product(2, "Remote GPU")]
    }

    /// Source that counts fetches and can be switched to fail.
    struct FakeSource {
        products: std::sync::Mutex<Vec<Product>>,
        fail: std::sync::atomic::AtomicBool,
        fetches: AtomicUsize,
        delay: Option<std::time::Duration>,
    }

    impl FakeSource {
        fn new(products: Vec<Product>) -> Self {
            Self {
                products: std::sync::Mutex::new(products),
                fail: std::sync::atomic::AtomicBool::new(false),
                fetches: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn failing() -> Self {
            let source = Self::new(Vec::new());
            source.set_failing(true);
            source
        }

        fn slow(products: Vec<Product>) -> Self {
            Self {
                delay: Some(std::time::Duration::from_millis(50)),
                ..Self::new(products)
            }
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn set_products(&self, products: Vec<Product>) {
            *self.products.lock().unwrap() = products;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductSource for FakeSource {
        async fn fetch(&self) -> Result<Vec<Product>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::NoLocations);
            }
            Ok(self.products.lock().unwrap().clone())
        }
    }

    /// Store whose `set` fails for one chosen key.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: std::sync::Mutex<Option<&'static str>>,
    }

    impl FlakyStore {
        fn break_key(&self, key: &'static str) {
            *self.broken.lock().unwrap() = Some(key);
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if *self.broken.lock().unwrap() == Some(key) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    fn flaky_manager(source: FakeSource) -> (Arc<FlakyStore>, Arc<ManualClock>, ProductCacheManager) {
        let store = Arc::new(FlakyStore::default());
        let clock = Arc::new(ManualClock::new(T0));
        let manager = ProductCacheManager::builder(store.clone(), Arc::new(source))
            .notifier(Arc::new(CollectingNotifier::new()))
            .clock(clock.clone())
            .build();
        (store, clock, manager)
    }

    struct Harness {
        store: Arc<MemoryStore>,
        source: Arc<FakeSource>,
        notifier: Arc<CollectingNotifier>,
        clock: Arc<ManualClock>,
        manager: ProductCacheManager,
    }

    fn harness(source: FakeSource) -> Harness {
        harness_with_store(source, MemoryStore::new())
    }

    fn harness_with_store(source: FakeSource, store: MemoryStore) -> Harness {
        let store = Arc::new(store);
        let source = Arc::new(source);
        let notifier = Arc::new(CollectingNotifier::new());
        let clock = Arc::new(ManualClock::new(T0));
        let manager = ProductCacheManager::builder(store.clone(), source.clone())
            .notifier(notifier.clone())
            .clock(clock.clone())
            .build();
        Harness {
            store,
            source,
            notifier,
            clock,
            manager,
        }
    }

    async fn seed(store: &MemoryStore, products: &[Product], timestamp: Option<i64>, admin: bool) {
        write_json(store, keys::PRODUCTS, products).await.unwrap();
        if let Some(ts) = timestamp {
            store
                .set(keys::PRODUCTS_TIMESTAMP, &ts.to_string())
                .await
                .unwrap();
        }
        store
            .set(keys::HAS_ADMIN_EDITS, if admin { "true" } else { "false" })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_empty_storage_fetches_and_persists() {
        let h = harness(FakeSource::new(remote()));

        let products = h.manager.load().await;

        assert_eq!(products, remote());
        assert_eq!(h.manager.phase(), CachePhase::SourceFetched);
        assert_eq!(
            read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
            Some(T0.to_string())
        );
        assert_eq!(
            read_raw(h.store.as_ref(), keys::HAS_ADMIN_EDITS).await.as_deref(),
            Some("false")
        );
        assert_eq!(
            read_json::<Vec<Product>>(h.store.as_ref(), keys::PRODUCTS).await,
            Some(remote())
        );
    }

    #[tokio::test]
    async fn test_admin_list_wins_over_remote() {
        let h = harness(FakeSource::new(remote()));
        let admin = vec![product(1, "Edited CPU")];
        seed(&h.store, &admin, None, true).await;
        h.clock.advance(100 * DEFAULT_FRESHNESS_WINDOW_MS);

        assert_eq!(h.manager.load().await, admin);
        assert_eq!(h.manager.phase(), CachePhase::AdminAuthoritative);
        assert_eq!(h.source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let h = harness(FakeSource::new(remote()));
        let cached = vec![product(9, "Cached")];
        seed(&h.store, &cached, Some(T0 - DEFAULT_FRESHNESS_WINDOW_MS + 1), false).await;

        assert_eq!(h.manager.load().await, cached);
        assert_eq!(h.manager.phase(), CachePhase::CacheFresh);
        assert_eq!(h.source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_cache_at_window_boundary_refetches() {
        let h = harness(FakeSource::new(remote()));
        seed(&h.store, &[product(9, "Cached")], Some(T0 - DEFAULT_FRESHNESS_WINDOW_MS), false)
            .await;

        assert_eq!(h.manager.load().await, remote());
        assert_eq!(h.source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_used_when_fetch_fails() {
        let h = harness(FakeSource::failing());
        let cached = vec![product(9, "Cached")];
        seed(&h.store, &cached, Some(T0 - 2 * DEFAULT_FRESHNESS_WINDOW_MS), false).await;

        assert_eq!(h.manager.load().await, cached);
        assert_eq!(h.manager.phase(), CachePhase::ErrorFallback);
        assert!(h.notifier.notices().is_empty());
        assert_eq!(
            read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
            Some((T0 - 2 * DEFAULT_FRESHNESS_WINDOW_MS).to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_without_cache_notifies_once() {
        let h = harness(FakeSource::failing());

        assert!(h.manager.load().await.is_empty());
        assert_eq!(h.manager.phase(), CachePhase::ErrorFallback);
        assert_eq!(
            h.notifier.notices(),
            vec![(LOAD_FAILED_NOTICE.to_string(), NoticeKind::Error)]
        );
    }

    #[tokio::test]
    async fn test_malformed_products_treated_as_absent() {
        let store = MemoryStore::with_entries([
            (keys::PRODUCTS, "not json"),
            (keys::HAS_ADMIN_EDITS, "true"),
        ]);
        let h = harness_with_store(FakeSource::new(remote()), store);

        assert_eq!(h.manager.load().await, remote());
    }

    #[tokio::test]
    async fn test_refresh_clears_admin_flag_and_rewrites_timestamp() {
        let h = harness(FakeSource::new(remote()));
        seed(&h.store, &[product(1, "Edited")], None, true).await;
        h.clock.advance(5_000);

        assert_eq!(h.manager.refresh().await, remote());
        assert_eq!(
            read_raw(h.store.as_ref(), keys::HAS_ADMIN_EDITS).await.as_deref(),
            Some("false")
        );
        assert_eq!(
            read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
            Some((T0 + 5_000).to_string())
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_memory_and_storage() {
        let h = harness(FakeSource::new(remote()));
        h.manager.load().await;
        h.source.set_failing(true);
        h.clock.advance(10);

        assert_eq!(h.manager.refresh().await, remote());
        assert_eq!(
            read_raw(h.store.as_ref(), keys::PRODUCTS_TIMESTAMP).await,
            Some(T0.to_string())
        );
    }

    #[tokio::test]
    async fn test_commit_then_load_returns_committed_list() {
        let h = harness(FakeSource::new(remote()));
        h.manager.load().await;

        let edited = vec![product(2, "Remote GPU")];
        h.manager.commit_admin_edits(edited.clone()).await.unwrap();
        h.clock.advance(10 * DEFAULT_FRESHNESS_WINDOW_MS);

        assert_eq!(h.manager.load().await, edited);
        assert_eq!(h.source.fetches(), 1);
        assert!(!h.store.contains(keys::PRODUCTS_TIMESTAMP).await);
        assert_eq!(h.manager.admin_working_copy().await, Some(edited));
    }

    #[tokio::test]
    async fn test_commit_rejects_invalid_list_without_writing() {
        let h = harness(FakeSource::new(remote()));
        let mut broken = product(3, "Broken");
        broken.price = Decimal::ZERO;

        let err = h
            .manager
            .commit_admin_edits(vec![product(1, "Ok"), broken])
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Validation(_)));
        assert!(!h.store.contains(keys::PRODUCTS).await);
        assert!(!h.store.contains(keys::HAS_ADMIN_EDITS).await);
    }

    #[tokio::test]
    async fn test_commit_publishes_to_subscribers() {
        let h = harness(FakeSource::new(remote()));
        let mut rx = h.manager.subscribe();
        let edited = vec![product(7, "Edited")];

        h.manager.commit_admin_edits(edited.clone()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), edited);
    }

    #[tokio::test]
    async fn test_reset_discards_admin_data() {
        let h = harness(FakeSource::new(remote()));
        h.manager
            .commit_admin_edits(vec![product(1, "Edited")])
            .await
            .unwrap();

        assert_eq!(h.manager.reset_to_source().await, remote());
        assert_eq!(h.manager.load().await, remote());
        assert!(h.manager.admin_working_copy().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_failure_keeps_memory_but_drops_admin_state() {
        let h = harness(FakeSource::failing());
        let edited = vec![product(1, "Edited")];
        h.manager.commit_admin_edits(edited.clone()).await.unwrap();

        assert_eq!(h.manager.reset_to_source().await, edited);
        assert_eq!(h.manager.phase(), CachePhase::ErrorFallback);
        assert!(!h.store.contains(keys::HAS_ADMIN_EDITS).await);
        assert!(!h.store.contains(keys::PRODUCTS).await);
    }

    #[tokio::test]
    async fn test_clear_all_then_load_fetches() {
        let h = harness(FakeSource::new(remote()));
        h.manager.load().await;
        h.store.set(keys::CART, "[]").await.unwrap();
        h.store.set(keys::ORDERS, "[]").await.unwrap();

        h.manager.clear_all().await.unwrap();
        for key in keys::ALL {
            assert!(!h.store.contains(key).await, "{key} survived clear");
        }
        assert!(h.manager.products().is_empty());
        assert_eq!(h.manager.phase(), CachePhase::Uninitialized);

        h.source.set_products(vec![product(3, "New")]);
        assert_eq!(h.manager.load().await, vec![product(3, "New")]);
        assert_eq!(h.source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let h = harness(FakeSource::slow(remote()));

        let (a, b, c) = tokio::join!(h.manager.load(), h.manager.load(), h.manager.load());

        assert_eq!(a, remote());
        assert_eq!(b, remote());
        assert_eq!(c, remote());
        assert_eq!(h.source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_fetch_once() {
        let h = harness(FakeSource::slow(remote()));

        let (a, b) = tokio::join!(h.manager.refresh(), h.manager.refresh());

        assert_eq!(a, b);
        assert_eq!(h.source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_fetch() {
        let h = harness(FakeSource::new(remote()));

        h.manager.refresh().await;
        h.manager.refresh().await;

        assert_eq!(h.source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_load_does_not_join_failed_refresh() {
        let source = FakeSource::slow(remote());
        source.set_failing(true);
        let h = harness(source);
        let cached = vec![product(9, "Cached")];
        seed(&h.store, &cached, Some(T0 - 10), false).await;

        let (refreshed, loaded) = tokio::join!(h.manager.refresh(), async {
            tokio::task::yield_now().await;
            h.manager.load().await
        });

        assert!(refreshed.is_empty());
        assert_eq!(loaded, cached);
        assert_eq!(h.manager.phase(), CachePhase::CacheFresh);
    }

    #[tokio::test]
    async fn test_refresh_after_failed_refresh_fetches_again() {
        let source = FakeSource::slow(remote());
        source.set_failing(true);
        let h = harness(source);

        tokio::join!(h.manager.refresh(), async {
            tokio::task::yield_now().await;
            h.manager.refresh().await
        });

        assert_eq!(h.source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_failed_loads_notify_once() {
        let h = harness(FakeSource {
            delay: Some(std::time::Duration::from_millis(50)),
            ..FakeSource::failing()
        });

        let (a, b) = tokio::join!(h.manager.load(), h.manager.load());

        assert!(a.is_empty() && b.is_empty());
        assert_eq!(h.source.fetches(), 1);
        assert_eq!(h.notifier.count(NoticeKind::Error), 1);
    }

    #[tokio::test]
    async fn test_load_queued_behind_clear_fetches_again() {
        let h = harness(FakeSource::slow(remote()));

        let (first, cleared, second) = tokio::join!(
            h.manager.load(),
            h.manager.clear_all(),
            h.manager.load()
        );

        assert_eq!(first, remote());
        cleared.unwrap();
        assert_eq!(second, remote());
        assert_eq!(h.source.fetches(), 2);
        assert_eq!(h.manager.phase(), CachePhase::SourceFetched);
    }

    #[tokio::test]
    async fn test_load_queued_behind_commit_reads_admin_list() {
        let h = harness(FakeSource::slow(remote()));
        let edited = vec![product(2, "Edited GPU")];

        let (first, committed, second) = tokio::join!(
            h.manager.load(),
            h.manager.commit_admin_edits(edited.clone()),
            h.manager.load()
        );

        assert_eq!(first, remote());
        committed.unwrap();
        assert_eq!(second, edited);
        assert_eq!(h.manager.phase(), CachePhase::AdminAuthoritative);
        assert_eq!(h.source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_refresh_queued_behind_reset_fetches_again() {
        let h = harness(FakeSource::slow(remote()));

        let (_, _, refreshed) = tokio::join!(
            h.manager.refresh(),
            h.manager.reset_to_source(),
            h.manager.refresh()
        );

        assert_eq!(refreshed, remote());
        assert_eq!(h.source.fetches(), 3);
    }

    #[tokio::test]
    async fn test_partial_refresh_write_keeps_admin_record() {
        let (store, _, manager) = flaky_manager(FakeSource::new(remote()));
        let edited = vec![product(1, "Edited CPU")];
        manager.commit_admin_edits(edited.clone()).await.unwrap();
        store.break_key(keys::HAS_ADMIN_EDITS);

        assert_eq!(manager.refresh().await, remote());

        assert_eq!(
            read_json::<Vec<Product>>(store.as_ref(), keys::PRODUCTS).await,
            Some(edited.clone())
        );
        assert_eq!(manager.inspect().await, CacheState::AdminAuthoritative(edited));
    }

    #[tokio::test]
    async fn test_partial_refresh_write_leaves_stale_list() {
        let (store, clock, manager) = flaky_manager(FakeSource::new(remote()));
        manager
            .commit_admin_edits(vec![product(1, "Edited CPU")])
            .await
            .unwrap();
        store.break_key(keys::PRODUCTS);
        clock.advance(10);

        manager.refresh().await;

        assert!(matches!(
            manager.inspect().await,
            CacheState::ServerStale { fetched_at: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_partial_commit_is_not_fresh() {
        let (store, _, manager) = flaky_manager(FakeSource::new(remote()));
        manager.load().await;
        store.break_key(keys::HAS_ADMIN_EDITS);

        let err = manager
            .commit_admin_edits(vec![product(1, "Edited CPU")])
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Storage(_)));
        assert!(matches!(
            manager.inspect().await,
            CacheState::ServerStale { fetched_at: None, .. }
        ));
    }
}
