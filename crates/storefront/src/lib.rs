//! Vexaparts storefront library.
//!
//! Local-first storefront for PC components: a product cache reconciled
//! against a read-only `products.json` source, catalog queries, a cart, an
//! order book, and an admin workspace for editing the product list. All
//! state lives in a [`storage::KeyValueStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod orders;
pub mod source;
pub mod state;
pub mod storage;

pub use cache::{CachePhase, CacheState, ProductCacheManager};
pub use config::StorefrontConfig;
pub use error::StorefrontError;
pub use state::Storefront;
