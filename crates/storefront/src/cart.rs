//! Shopping cart persisted under the `cart` key.
//!
//! The cart holds copies of product data taken when a line was added; later
//! price edits do not change existing lines.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};
use vexaparts_core::{CartItem, NoticeKind, OrderTotals, Product, ProductId};

use crate::notify::Notifier;
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the current product list.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The product lacks the data needed for a cart line.
    #[error("Product {0} has invalid data")]
    InvalidProduct(ProductId),

    /// The cart line does not exist.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Cart bound to a store and notifier.
#[derive(Clone)]
pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl Cart {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Current cart lines.
    ///
    /// Lines that cannot be used (missing name or image, non-positive price
    /// or quantity, undecodable) are dropped and the cleaned cart is written
    /// back.
    pub async fn items(&self) -> Vec<CartItem> {
        let Some(raw) = read_json::<Vec<serde_json::Value>>(self.store.as_ref(), keys::CART).await
        else {
            return Vec::new();
        };

        let total = raw.len();
        let items: Vec<CartItem> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value::<CartItem>(value).ok())
            .filter(CartItem::is_valid)
            .collect();

        if items.len() != total {
            warn!(dropped = total - items.len(), "Dropped invalid cart lines");
            if let Err(e) = self.save(&items).await {
                warn!(error = %e, "Failed to write back cleaned cart");
            }
        }
        items
    }

    /// Add one unit of a product from `products`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is unknown or incomplete, or if the
    /// cart cannot be saved.
    #[instrument(skip(self, products))]
    pub async fn add(&self, products: &[Product], id: ProductId) -> Result<CartItem, CartError> {
        let Some(product) = products.iter().find(|p| p.id == id) else {
            self.notifier.notify(
                "Product niet gevonden. Probeer de pagina te verversen.",
                NoticeKind::Error,
            );
            return Err(CartError::ProductNotFound(id));
        };
        if product.validate().is_err() {
            self.notifier.notify(
                "Product data is ongeldig. Probeer de pagina te verversen.",
                NoticeKind::Error,
            );
            return Err(CartError::InvalidProduct(id));
        }

        let mut items = self.items().await;
        let line = if let Some(existing) = items.iter_mut().find(|item| item.id == id) {
            existing.quantity = existing.quantity.saturating_add(1);
            existing.clone()
        } else {
            let line = CartItem::from_product(product);
            items.push(line.clone());
            line
        };
        self.save(&items).await?;

        debug!(%id, quantity = line.quantity, "Added to cart");
        self.notifier.notify(
            &format!("{} toegevoegd aan winkelwagen!", product.name),
            NoticeKind::Success,
        );
        Ok(line)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the cart cannot be saved.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: ProductId) -> Result<(), CartError> {
        let mut items = self.items().await;
        let Some(position) = items.iter().position(|item| item.id == id) else {
            return Err(CartError::NotInCart(id));
        };
        let removed = items.remove(position);
        self.save(&items).await?;

        self.notifier.notify(
            &format!("{} verwijderd uit winkelwagen", removed.name),
            NoticeKind::Success,
        );
        Ok(())
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the cart cannot be saved.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, id: ProductId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove(id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut items = self.items().await;
        let Some(line) = items.iter_mut().find(|item| item.id == id) else {
            return Err(CartError::NotInCart(id));
        };
        let previous = line.quantity;
        line.quantity = quantity;
        let name = line.name.clone();
        self.save(&items).await?;

        if quantity > previous {
            self.notifier.notify(
                &format!("{name} hoeveelheid verhoogd naar {quantity}"),
                NoticeKind::Success,
            );
        } else if quantity < previous {
            self.notifier.notify(
                &format!("{name} hoeveelheid verlaagd naar {quantity}"),
                NoticeKind::Success,
            );
        }
        Ok(())
    }

    /// Empty the cart, returning the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the `cart` key cannot be removed.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<usize, CartError> {
        let count = self.items().await.len();
        if count == 0 {
            self.notifier
                .notify("Winkelwagen is al leeg", NoticeKind::Success);
            return Ok(0);
        }

        self.store.remove(keys::CART).await?;
        let suffix = if count > 1 { "en" } else { "" };
        self.notifier.notify(
            &format!("{count} product{suffix} verwijderd uit winkelwagen"),
            NoticeKind::Success,
        );
        Ok(count)
    }

    /// Totals over the current cart.
    pub async fn totals(&self) -> OrderTotals {
        OrderTotals::for_items(&self.items().await)
    }

    async fn save(&self, items: &[CartItem]) -> Result<(), StorageError> {
        write_json(self.store.as_ref(), keys::CART, items).await
    }
}
