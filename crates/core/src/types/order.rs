//! Cart lines, checkout totals and recorded orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;
use super::status::OrderStatus;

/// Orders from this subtotal on ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(60, 0, 0, false, 0);
/// Flat shipping fee below the free-shipping threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(495, 0, 0, false, 2);
/// Dutch VAT rate applied on top of the subtotal.
pub const VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// One line of the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    /// A single unit of `product`.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// Whether the line can take part in cart math.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
            && !self.image.is_empty()
            && self.price > Decimal::ZERO
            && self.quantity > 0
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Money breakdown of a cart at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vat: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals over the valid lines of a cart.
    #[must_use]
    pub fn for_items(items: &[CartItem]) -> Self {
        let subtotal: Decimal = items
            .iter()
            .filter(|item| item.is_valid())
            .map(CartItem::line_total)
            .sum();
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        let vat = subtotal * VAT_RATE;
        Self {
            subtotal,
            shipping,
            vat,
            total: subtotal + shipping + vat,
        }
    }
}

/// Shipping address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

/// Customer details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
}

impl Customer {
    /// First and last name joined.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: String,
    pub customer: Customer,
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Item {id}"),
            price: Decimal::new(cents, 2),
            image: "i.png".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(FREE_SHIPPING_THRESHOLD, Decimal::new(60, 0));
        assert_eq!(SHIPPING_FEE, Decimal::new(495, 2));
        assert_eq!(VAT_RATE, Decimal::new(21, 2));
    }

    #[test]
    fn test_totals_below_free_shipping() {
        let totals = OrderTotals::for_items(&[item(1, 1000, 2)]);
        assert_eq!(totals.subtotal, Decimal::new(20, 0));
        assert_eq!(totals.shipping, SHIPPING_FEE);
        assert_eq!(totals.vat, Decimal::new(420, 2));
        assert_eq!(totals.total, Decimal::new(2915, 2));
    }

    #[test]
    fn test_totals_free_shipping_at_threshold() {
        let totals = OrderTotals::for_items(&[item(1, 3000, 2)]);
        assert_eq!(totals.subtotal, Decimal::new(60, 0));
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_totals_skip_invalid_lines() {
        let totals = OrderTotals::for_items(&[item(1, 1000, 1), item(2, 0, 4), item(3, 500, 0)]);
        assert_eq!(totals.subtotal, Decimal::new(10, 0));
    }

    #[test]
    fn test_order_json_is_camel_case() {
        let order = Order {
            order_number: "VEX-12345678-AB12".to_string(),
            customer: Customer {
                first_name: "Sanne".to_string(),
                last_name: "de Vries".to_string(),
                email: "sanne@example.nl".to_string(),
                ..Customer::default()
            },
            items: vec![item(1, 1000, 3)],
            totals: OrderTotals::for_items(&[item(1, 1000, 3)]),
            payment_method: "ideal".to_string(),
            notes: None,
            order_date: DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            status: OrderStatus::Confirmed,
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["orderNumber"], "VEX-12345678-AB12");
        assert_eq!(value["customer"]["firstName"], "Sanne");
        assert_eq!(order.total_items(), 3);
        assert_eq!(order.customer.full_name(), "Sanne de Vries");
    }
}
