//! Order commands.

use vexaparts_core::Customer;
use vexaparts_storefront::orders::Checkout;
use vexaparts_storefront::{Storefront, StorefrontError};

use crate::output;

/// Assemble checkout details from command-line fields.
#[must_use]
pub const fn checkout(customer: Customer, payment_method: String, notes: Option<String>) -> Checkout {
    Checkout {
        customer,
        payment_method,
        notes,
    }
}

/// Place an order for the current cart.
///
/// # Errors
///
/// Returns `EmptyCart` or the storage failure.
pub async fn place(storefront: &Storefront, checkout: Checkout) -> Result<(), StorefrontError> {
    let order = storefront.orders().place(checkout).await?;
    output::order_placed(&order);
    Ok(())
}

/// Print orders, newest first.
pub async fn list(storefront: &Storefront, search: Option<&str>) {
    let orders = match search {
        Some(query) => storefront.orders().search(query).await,
        None => storefront.orders().list().await,
    };
    output::orders(&orders);
}
