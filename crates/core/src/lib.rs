//! Bitshelf Core - Shared types library.
//!
//! This crate provides the domain types shared between the storefront
//! binary and the integration-test harness.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. All
//! durable state lives behind the remote bookshop API; these types
//! exist so that identifiers, money amounts, and enumerations cannot
//! be mixed up on the way there.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and book conditions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
