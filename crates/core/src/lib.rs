//! Orchard Core - Shared types library.
//!
//! This crate provides common types used across all Orchard components:
//! - `storefront` - Public checkout flow (port 3000)
//! - `admin` - Inventory and service-management console (port 3001)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session access. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for tenants, IDs, emails, addresses, prices
//!   and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
