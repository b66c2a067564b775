//! Vexaparts Core - Shared types library.
//!
//! This crate provides the types shared by every Vexaparts component:
//! - `storefront` - Product cache, catalog, cart, orders and admin workspace
//! - `cli` - Command-line driver for the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product, category, price, cart and order types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
