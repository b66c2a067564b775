//! Product cache and catalog commands.
//!
//! # Usage
//!
//! ```bash
//! vexa products load
//! vexa products refresh
//! vexa products list --category cpu --search am5 --sort price-desc
//! vexa products show 1700000000000
//! vexa products featured
//! ```

use vexaparts_core::{Category, ProductId};
use vexaparts_storefront::catalog::{self, CatalogQuery, SortOrder};
use vexaparts_storefront::{Storefront, StorefrontError};

use crate::output;

/// Resolve the product list and print it.
pub async fn load(storefront: &Storefront) {
    let products = storefront.products().load().await;
    tracing::info!(count = products.len(), phase = ?storefront.products().phase(), "Products loaded");
    output::product_table(&products);
}

/// Force a fetch from the source.
pub async fn refresh(storefront: &Storefront) {
    let products = storefront.products().refresh().await;
    output::line(format!("Producten ververst ({})", products.len()));
}

/// Drop admin edits and cached products, then fetch.
pub async fn reset(storefront: &Storefront) {
    let count = storefront.products().reset_to_source().await.len();
    output::line(format!("Producten gereset ({count})"));
}

/// Remove every storefront key.
///
/// # Errors
///
/// Returns the storage failure.
pub async fn clear(storefront: &Storefront) -> Result<(), StorefrontError> {
    storefront.products().clear_all().await?;
    output::line("Opslag geleegd");
    Ok(())
}

/// Print one product with related products.
///
/// # Errors
///
/// Returns `ProductNotFound` if the id is not in the current list.
pub async fn show(storefront: &Storefront, id: ProductId) -> Result<(), StorefrontError> {
    let products = storefront.products().load().await;
    let product = catalog::find(&products, id).ok_or(StorefrontError::ProductNotFound(id))?;
    output::product_detail(product, &catalog::related(&products, product));
    Ok(())
}

/// Print the filtered, sorted catalog.
pub async fn list(
    storefront: &Storefront,
    category: Option<Category>,
    search: Option<String>,
    sort: &str,
) {
    let products = storefront.products().load().await;
    let query = CatalogQuery {
        category,
        search,
        sort: SortOrder::parse(sort),
    };
    output::product_table(&catalog::filter_and_sort(&products, &query));
}

/// Print the best sellers.
pub async fn featured(storefront: &Storefront) {
    let products = storefront.products().load().await;
    output::product_table(catalog::best_sellers(&products));
}
