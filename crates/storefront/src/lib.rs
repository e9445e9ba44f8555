//! Orchard Storefront library.
//!
//! Multi-tenant checkout served under `/{tenant}/...`. This crate exposes
//! the router and its parts as a library so they can be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
