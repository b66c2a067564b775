//! Storefront session state shared across commands.

use std::sync::Arc;

use crate::admin::AdminWorkspace;
use crate::cache::ProductCacheManager;
use crate::cart::Cart;
use crate::config::StorefrontConfig;
use crate::notify::{Notifier, TracingNotifier};
use crate::orders::OrderBook;
use crate::source::StaticSource;
use crate::storage::{FileStore, KeyValueStore};

/// One storefront session.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// product cache, cart and order book over a single store.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    products: ProductCacheManager,
    cart: Cart,
    orders: OrderBook,
}

impl Storefront {
    /// Create a session over a directory-backed store and a static source.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage_dir));
        let source = Arc::new(StaticSource::new(config.candidate_locations()));
        Self::with_parts(config, store, source, Arc::new(TracingNotifier))
    }

    /// Create a session from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn crate::source::ProductSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let products = ProductCacheManager::builder(store.clone(), source)
            .notifier(notifier.clone())
            .freshness_window_ms(config.freshness_window_ms)
            .build();
        let cart = Cart::new(store.clone(), notifier.clone());
        let orders = OrderBook::new(store, cart.clone(), notifier, products.clock().clone());

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                products,
                cart,
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product cache manager.
    #[must_use]
    pub fn products(&self) -> &ProductCacheManager {
        &self.inner.products
    }

    /// Get a reference to the cart.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.inner.cart
    }

    /// Get a reference to the order book.
    #[must_use]
    pub fn orders(&self) -> &OrderBook {
        &self.inner.orders
    }

    /// Open an admin workspace over this session's product cache.
    pub async fn admin(&self) -> AdminWorkspace {
        AdminWorkspace::open(self.inner.products.clone()).await
    }
}
