//! Unified error handling with Sentry integration.
//!
//! Provides a unified `StorefrontError` for callers driving several
//! storefront components. Use [`StorefrontError::report`] at the outer edge
//! to log and capture failures before showing a message to the user.

use thiserror::Error;
use vexaparts_core::{ProductId, ValidationError};

use crate::cache::CacheError;
use crate::cart::CartError;
use crate::config::ConfigError;
use crate::orders::OrderError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local store operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Product data was rejected.
    #[error("Invalid product: {0}")]
    Validation(#[from] ValidationError),

    /// Committing admin edits failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Placing an order failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Product is not in the current list.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
}

impl StorefrontError {
    /// Whether the failure points at the environment rather than the input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Storage(_)
                | Self::Cache(CacheError::Storage(_))
                | Self::Cart(CartError::Storage(_))
                | Self::Order(OrderError::Storage(_))
        )
    }

    /// Log the error and capture internal failures to Sentry.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
