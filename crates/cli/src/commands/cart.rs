//! Cart commands.

use vexaparts_core::ProductId;
use vexaparts_storefront::{Storefront, StorefrontError};

use crate::output;

/// Add one unit of a product from the current product list.
///
/// # Errors
///
/// Returns the cart failure (unknown product, invalid data, storage).
pub async fn add(storefront: &Storefront, id: ProductId) -> Result<(), StorefrontError> {
    let products = storefront.products().load().await;
    let line = storefront.cart().add(&products, id).await?;
    output::line(format!("{} toegevoegd ({}x)", line.name, line.quantity));
    Ok(())
}

/// Remove a cart line.
///
/// # Errors
///
/// Returns the cart failure.
pub async fn remove(storefront: &Storefront, id: ProductId) -> Result<(), StorefrontError> {
    storefront.cart().remove(id).await?;
    show(storefront).await;
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns the cart failure.
pub async fn set(storefront: &Storefront, id: ProductId, quantity: i64) -> Result<(), StorefrontError> {
    storefront.cart().set_quantity(id, quantity).await?;
    show(storefront).await;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns the storage failure.
pub async fn clear(storefront: &Storefront) -> Result<(), StorefrontError> {
    let removed = storefront.cart().clear().await?;
    output::line(format!("{removed} regel(s) verwijderd"));
    Ok(())
}

/// Print the cart with totals.
pub async fn show(storefront: &Storefront) {
    let items = storefront.cart().items().await;
    let totals = storefront.cart().totals().await;
    output::cart(&items, &totals);
}
