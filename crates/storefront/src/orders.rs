//! Order book persisted under the `orders` key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument};
use vexaparts_core::{Customer, NoticeKind, Order, OrderStatus, OrderTotals};

use crate::cache::Clock;
use crate::cart::Cart;
use crate::notify::Notifier;
use crate::storage::{KeyValueStore, StorageError, keys, read_json, write_json};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Checkout details supplied by the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub customer: Customer,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Order history plus checkout.
#[derive(Clone)]
pub struct OrderBook {
    store: Arc<dyn KeyValueStore>,
    cart: Cart,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl OrderBook {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        cart: Cart,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cart,
            notifier,
            clock,
        }
    }

    /// Record an order for the current cart and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] when there is nothing to order, or a
    /// storage error if the order cannot be recorded.
    #[instrument(skip(self, checkout), fields(payment_method = %checkout.payment_method))]
    pub async fn place(&self, checkout: Checkout) -> Result<Order, OrderError> {
        let items = self.cart.items().await;
        if items.is_empty() {
            self.notifier
                .notify("Je winkelwagen is leeg", NoticeKind::Error);
            return Err(OrderError::EmptyCart);
        }

        let now = self.clock.now_millis();
        let order = Order {
            order_number: order_number(now, &mut rand::rng()),
            customer: checkout.customer,
            totals: OrderTotals::for_items(&items),
            items,
            payment_method: checkout.payment_method,
            notes: checkout.notes.filter(|n| !n.trim().is_empty()),
            order_date: DateTime::from_timestamp_millis(now).unwrap_or_else(Utc::now),
            status: OrderStatus::Confirmed,
        };

        let mut orders = self.stored().await;
        orders.push(order.clone());
        write_json(self.store.as_ref(), keys::ORDERS, &orders).await?;
        self.store.remove(keys::CART).await?;

        info!(order_number = %order.order_number, total = %order.totals.total, "Order placed");
        Ok(order)
    }

    /// All orders, newest first.
    pub async fn list(&self) -> Vec<Order> {
        let mut orders = self.stored().await;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        orders
    }

    /// Orders whose number or any item name contains `query`.
    pub async fn search(&self, query: &str) -> Vec<Order> {
        let orders = self.list().await;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return orders;
        }
        orders
            .into_iter()
            .filter(|order| {
                order.order_number.to_lowercase().contains(&query)
                    || order
                        .items
                        .iter()
                        .any(|item| item.name.to_lowercase().contains(&query))
            })
            .collect()
    }

    async fn stored(&self) -> Vec<Order> {
        read_json(self.store.as_ref(), keys::ORDERS)
            .await
            .unwrap_or_default()
    }
}

/// `VEX-<last 8 digits of epoch ms>-<4 random base36 chars>`.
fn order_number(now_millis: i64, rng: &mut impl Rng) -> String {
    const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET.get(idx).copied().map_or('0', char::from)
        })
        .collect();
    format!("VEX-{:08}-{suffix}", now_millis.rem_euclid(100_000_000))
}
