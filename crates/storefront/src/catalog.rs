//! Catalog queries over an in-memory product list.
//!
//! All functions are pure; they take the list the cache manager resolved and
//! never touch storage.

use vexaparts_core::{Category, CategoryPriority, Product, ProductId};

/// Number of products shown as best sellers on the home page.
pub const BEST_SELLER_COUNT: usize = 4;

/// Maximum number of related products on a detail page.
pub const RELATED_COUNT: usize = 4;

/// Catalog sort order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// Parse from a filter value. Unknown values keep the default order.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "name-desc" => Self::NameDesc,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            _ => Self::NameAsc,
        }
    }

    /// Convert to filter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }
}

/// Catalog filter state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

/// Category used by catalog pages.
#[must_use]
pub fn category_of(product: &Product) -> Category {
    Category::infer(product, CategoryPriority::Catalog)
}

/// Case-insensitive match against the name and every specification value.
#[must_use]
pub fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    product.name.to_lowercase().contains(&term)
        || product
            .specifications
            .values()
            .any(|value| value.to_lowercase().contains(&term))
}

/// Apply category filter, search and sort.
#[must_use]
pub fn filter_and_sort(products: &[Product], query: &CatalogQuery) -> Vec<Product> {
    let mut filtered: Vec<Product> = products
        .iter()
        .filter(|p| query.category.is_none_or(|c| category_of(p) == c))
        .filter(|p| {
            query
                .search
                .as_deref()
                .is_none_or(|term| matches_search(p, term))
        })
        .cloned()
        .collect();

    match query.sort {
        SortOrder::NameAsc => filtered.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortOrder::NameDesc => filtered.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortOrder::PriceAsc => filtered.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOrder::PriceDesc => filtered.sort_by(|a, b| b.price.cmp(&a.price)),
    }
    filtered
}

fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// The first few products, in list order.
#[must_use]
pub fn best_sellers(products: &[Product]) -> &[Product] {
    products.get(..BEST_SELLER_COUNT).unwrap_or(products)
}

/// Look up a product by id.
#[must_use]
pub fn find(products: &[Product], id: ProductId) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

/// Other products of the same catalog category.
#[must_use]
pub fn related(products: &[Product], product: &Product) -> Vec<Product> {
    let category = category_of(product);
    products
        .iter()
        .filter(|p| p.id != product.id && category_of(p) == category)
        .take(RELATED_COUNT)
        .cloned()
        .collect()
}

/// First three specification values joined for a product card.
#[must_use]
pub fn short_specs(product: &Product) -> String {
    product
        .specifications
        .values()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" • ")
}

/// Generated description for products without one.
#[must_use]
pub fn describe(product: &Product) -> String {
    if let Some(description) = product.description.as_deref().filter(|d| !d.trim().is_empty()) {
        return description.to_string();
    }

    let category = category_of(product).display_name().to_lowercase();
    let mut text = format!(
        "Deze {category} van {} biedt uitstekende prestaties voor uw PC build. ",
        product.name
    );
    let specs: Vec<&str> = product
        .specifications
        .values()
        .take(3)
        .map(String::as_str)
        .collect();
    if !specs.is_empty() {
        text.push_str(&format!(
            "Met specificaties zoals {} levert dit product betrouwbare en snelle prestaties. ",
            specs.join(", ")
        ));
    }
    text.push_str(
        "Perfect voor gaming, werkstations of algemeen gebruik. \
         Leverbaar met gratis verzending en 2 jaar garantie.",
    );
    text
}
