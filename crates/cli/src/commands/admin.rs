//! Admin product commands.
//!
//! Every mutation is saved straight away, so other sessions see it on their
//! next load.
//!
//! # Usage
//!
//! ```bash
//! vexa admin add -n "RTX 4070 Super" -c gpu -p 649.99 -i img/4070s.png
//! vexa admin edit 1700000000000 --price 599.00
//! vexa admin delete 1700000000000
//! ```

use rust_decimal::Decimal;
use vexaparts_core::{Category, Product, ProductDraft, ProductId};
use vexaparts_storefront::{Storefront, StorefrontError};

use crate::output;

/// Product fields given on the command line; `None` means "not given".
pub struct ProductEdit {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl ProductEdit {
    /// Draft for a new product.
    fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name.unwrap_or_default(),
            category: self
                .category
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            price: self.price,
            image: self.image.unwrap_or_default(),
            description: self.description,
        }
    }

    /// Draft that keeps `current` values for every field not given.
    fn over(self, current: &Product) -> ProductDraft {
        ProductDraft {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            category: self.category.map_or_else(
                || {
                    current
                        .category
                        .clone()
                        .unwrap_or_else(|| "other".to_string())
                },
                |c| c.as_str().to_string(),
            ),
            price: self.price.or(Some(current.price)),
            image: self.image.unwrap_or_else(|| current.image.clone()),
            description: self.description.or_else(|| current.description.clone()),
        }
    }
}

/// Add a product and save.
///
/// # Errors
///
/// Returns the validation or commit failure.
pub async fn add(storefront: &Storefront, fields: ProductEdit) -> Result<(), StorefrontError> {
    let mut workspace = storefront.admin().await;
    let id = workspace.add(fields.into_draft())?.id;
    workspace.save().await?;
    output::line(format!("Product {id} toegevoegd en opgeslagen"));
    Ok(())
}

/// Edit a product and save.
///
/// # Errors
///
/// Returns `ProductNotFound`, or the validation or commit failure.
pub async fn edit(
    storefront: &Storefront,
    id: ProductId,
    fields: ProductEdit,
) -> Result<(), StorefrontError> {
    let mut workspace = storefront.admin().await;
    let index = workspace
        .index_of(id)
        .ok_or(StorefrontError::ProductNotFound(id))?;
    let draft = workspace
        .products()
        .get(index)
        .map(|current| fields.over(current))
        .ok_or(StorefrontError::ProductNotFound(id))?;

    workspace.edit(index, draft)?;
    workspace.save().await?;
    output::line(format!("Product {id} bijgewerkt en opgeslagen"));
    Ok(())
}

/// Delete a product and save.
///
/// # Errors
///
/// Returns `ProductNotFound` or the commit failure.
pub async fn delete(storefront: &Storefront, id: ProductId) -> Result<(), StorefrontError> {
    let mut workspace = storefront.admin().await;
    let index = workspace
        .index_of(id)
        .ok_or(StorefrontError::ProductNotFound(id))?;

    let removed = workspace.delete(index)?;
    workspace.save().await?;
    output::line(format!("{} verwijderd en opgeslagen", removed.name));
    Ok(())
}

/// Print the admin working copy.
pub async fn list(storefront: &Storefront) {
    let workspace = storefront.admin().await;
    output::admin_table(workspace.products());
}
