//! Product entity and admin-side validation.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Stock count assumed when a product carries none.
pub const DEFAULT_STOCK_AMOUNT: u32 = 10;

/// Errors raised when caller-supplied products fail validation.
///
/// Validation happens before anything is persisted, so a failing product
/// list is never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is empty or absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The price is zero or negative.
    #[error("price must be greater than zero")]
    NonPositivePrice,

    /// Two products in the same list share an id.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    /// No product exists at the given position of the working list.
    #[error("no product at index {0}")]
    NotFound(usize),

    /// A product inside a list failed validation.
    #[error("product {id}: {reason}")]
    InvalidProduct {
        id: ProductId,
        reason: Box<ValidationError>,
    },
}

/// A sellable item.
///
/// Field names and the JSON shape match the `products.json` source and the
/// persisted `products` key, so lists round-trip between the two unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl Product {
    /// Stock count, falling back to [`DEFAULT_STOCK_AMOUNT`].
    #[must_use]
    pub fn stock_amount(&self) -> u32 {
        self.amount.unwrap_or(DEFAULT_STOCK_AMOUNT)
    }

    /// Check the fields the cart and checkout math depend on.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: empty name, empty image, or a price
    /// that is not strictly positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.image.trim().is_empty() {
            return Err(ValidationError::MissingField("image"));
        }
        if self.price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice);
        }
        Ok(())
    }
}

/// Validate a whole product list: every product individually, then id
/// uniqueness.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidProduct`] for the first bad product or
/// [`ValidationError::DuplicateId`] for the first repeated id.
pub fn validate_product_list(products: &[Product]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(products.len());
    for product in products {
        product
            .validate()
            .map_err(|reason| ValidationError::InvalidProduct {
                id: product.id,
                reason: Box::new(reason),
            })?;
        if !seen.insert(product.id) {
            return Err(ValidationError::DuplicateId(product.id));
        }
    }
    Ok(())
}

/// Shape of the static `products.json` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCatalogue {
    pub components: Vec<Product>,
}

/// Admin form input for adding or editing a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub price: Option<Decimal>,
    pub image: String,
    pub description: Option<String>,
}

impl ProductDraft {
    /// Check that every required form field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for an empty name, category,
    /// price or image, and [`ValidationError::NonPositivePrice`] for a price
    /// that is zero or negative.
    pub fn validate(&self) -> Result<Decimal, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        let price = self.price.ok_or(ValidationError::MissingField("price"))?;
        if self.image.trim().is_empty() {
            return Err(ValidationError::MissingField("image"));
        }
        if price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice);
        }
        Ok(price)
    }

    /// Build a brand-new product with default stock and no specifications.
    ///
    /// # Errors
    ///
    /// Returns the validation failure of [`Self::validate`].
    pub fn into_new_product(self, id: ProductId) -> Result<Product, ValidationError> {
        let price = self.validate()?;
        Ok(Product {
            id,
            name: self.name.trim().to_string(),
            category: Some(self.category.trim().to_string()),
            price,
            image: self.image.trim().to_string(),
            description: normalize_description(self.description),
            amount: Some(DEFAULT_STOCK_AMOUNT),
            specifications: BTreeMap::new(),
        })
    }

    /// Replace every editable field of `previous`.
    ///
    /// The id is kept, and stock amount and specifications carry over since
    /// the edit form does not expose them.
    ///
    /// # Errors
    ///
    /// Returns the validation failure of [`Self::validate`].
    pub fn apply_to(self, previous: &Product) -> Result<Product, ValidationError> {
        let price = self.validate()?;
        Ok(Product {
            id: previous.id,
            name: self.name.trim().to_string(),
            category: Some(self.category.trim().to_string()),
            price,
            image: self.image.trim().to_string(),
            description: normalize_description(self.description),
            amount: Some(previous.stock_amount()),
            specifications: previous.specifications.clone(),
        })
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
