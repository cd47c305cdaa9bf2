//! ShopHub Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront binary and its
//! tests:
//! - `storefront` - Server-rendered shop front with a synchronized cart
//! - `integration-tests` - Wire-level tests against a mocked hosted backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! Remote rows deserialize straight into these types.
//!
//! # Modules
//!
//! - [`types`] - Opaque IDs, prices, emails, cart lines and catalog products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
