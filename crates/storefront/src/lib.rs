//! Bitshelf storefront library.
//!
//! Server-rendered bookshop storefront in front of the bookshop REST
//! API. Provided as a library so the integration tests can drive the
//! router and the API client directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
