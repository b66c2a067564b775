//! Core types for Vexaparts.
//!
//! This module provides type-safe wrappers for the storefront domain.

pub mod category;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use category::{Category, CategoryPriority};
pub use id::*;
pub use order::{Address, CartItem, Customer, Order, OrderTotals};
pub use price::{format_eur, round_cents};
pub use product::{
    DEFAULT_STOCK_AMOUNT, Product, ProductCatalogue, ProductDraft, ValidationError,
    validate_product_list,
};
pub use status::{NoticeKind, OrderStatus};
