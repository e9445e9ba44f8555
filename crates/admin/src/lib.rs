//! Orchard Admin library.
//!
//! Back-office grids for inventory and service management, served under
//! `/{tenant}/...`. This crate exposes the router and its parts as a library
//! so they can be tested and reused.
//!
//! # Security
//!
//! This crate holds the service-management API token. Only deploy it on the
//! private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
