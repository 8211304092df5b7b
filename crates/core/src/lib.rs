//! cartsync core - shared domain types.
//!
//! This crate provides the types used across all cartsync components:
//! - `storefront` - Cart synchronization controller and JSON views
//! - `cli` - Command-line driver for the same controller
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no async runtime. The remote commerce API is the source of truth
//! for every value defined here; these types only describe what it returns.
//!
//! # Modules
//!
//! - [`types`] - Opaque ids, prices, quantities, carts, products and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
