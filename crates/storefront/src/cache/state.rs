//! Classification of the persisted cache record.
//!
//! The three storage keys (`products`, `productsTimestamp`,
//! `hasAdminEdits`) are read once into a [`CacheRecord`] and collapsed into a
//! single [`CacheState`]. The load precedence is then a pure function of that
//! value.

use tracing::warn;
use vexaparts_core::Product;

use crate::storage::{KeyValueStore, keys, read_json, read_raw};

/// Default freshness window: one hour.
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 3_600_000;

/// Which source the in-memory list of a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CachePhase {
    /// Nothing loaded yet, or storage was just cleared.
    #[default]
    Uninitialized,
    /// Admin-saved list, exempt from freshness checks.
    AdminAuthoritative,
    /// Cached server list inside the freshness window.
    CacheFresh,
    /// Cached server list past the freshness window.
    CacheStale,
    /// Fetched from the source during this operation.
    SourceFetched,
    /// Source fetch failed; previous data (or nothing) is in use.
    ErrorFallback,
}

/// Raw persisted cache record. Malformed values are already dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    pub products: Option<Vec<Product>>,
    pub timestamp: Option<i64>,
    pub has_admin_edits: bool,
}

impl CacheRecord {
    /// Read the record from storage.
    pub async fn read(store: &dyn KeyValueStore) -> Self {
        let products = read_json::<Vec<Product>>(store, keys::PRODUCTS).await;
        let timestamp = read_raw(store, keys::PRODUCTS_TIMESTAMP)
            .await
            .and_then(|raw| match raw.trim().parse::<i64>() {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!(raw, error = %e, "Malformed products timestamp, treating as absent");
                    None
                }
            });
        let has_admin_edits = read_raw(store, keys::HAS_ADMIN_EDITS)
            .await
            .is_some_and(|raw| raw.trim() == "true");

        Self {
            products,
            timestamp,
            has_admin_edits,
        }
    }

    /// Collapse the record into a tagged state.
    ///
    /// A list without a timestamp (and without the admin flag) counts as
    /// fetched at epoch zero, which makes it stale.
    #[must_use]
    pub fn classify(self, now_ms: i64, freshness_window_ms: i64) -> CacheState {
        let Some(products) = self.products else {
            return CacheState::Empty;
        };
        if self.has_admin_edits {
            return CacheState::AdminAuthoritative(products);
        }
        let fetched_at = self.timestamp.unwrap_or(0);
        if now_ms.saturating_sub(fetched_at) < freshness_window_ms {
            CacheState::ServerFresh {
                products,
                fetched_at,
            }
        } else {
            CacheState::ServerStale {
                products,
                fetched_at: self.timestamp,
            }
        }
    }
}

/// Single-value view of the persisted cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// No usable product list is stored.
    Empty,
    /// Admin-saved list; wins over any freshness rule.
    AdminAuthoritative(Vec<Product>),
    /// Server list fetched inside the freshness window.
    ServerFresh {
        products: Vec<Product>,
        fetched_at: i64,
    },
    /// Server list past the freshness window (or without a timestamp).
    ServerStale {
        products: Vec<Product>,
        fetched_at: Option<i64>,
    },
}

/// What a load should do for a given cache state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Use the stored list as-is.
    Use {
        products: Vec<Product>,
        phase: CachePhase,
    },
    /// Fetch the source; on failure fall back to the stored list, if any.
    Fetch { fallback: Option<Vec<Product>> },
}

impl CacheState {
    /// Apply the load precedence: admin edits, then fresh cache, then fetch.
    #[must_use]
    pub fn resolve(self) -> Resolution {
        match self {
            Self::AdminAuthoritative(products) => Resolution::Use {
                products,
                phase: CachePhase::AdminAuthoritative,
            },
            Self::ServerFresh { products, .. } => Resolution::Use {
                products,
                phase: CachePhase::CacheFresh,
            },
            Self::ServerStale { products, .. } => Resolution::Fetch {
                fallback: Some(products),
            },
            Self::Empty => Resolution::Fetch { fallback: None },
        }
    }
}
