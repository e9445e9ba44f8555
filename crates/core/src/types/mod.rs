//! Core types for Orchard.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod fulfillment;
pub mod id;
pub mod pagination;
pub mod price;
pub mod tenant;
pub mod validation;

pub use address::{Address, AddressDraft, AddressType, ShippingLocation, order_for_selection};
pub use email::{Email, EmailError};
pub use fulfillment::FulfillmentMethod;
pub use id::*;
pub use pagination::{Page, PageRequest};
pub use price::{CurrencyCode, Price};
pub use tenant::{StorageKey, TenantError, TenantSlug};
pub use validation::FieldError;
