//! Business logic services for admin.
//!
//! # Services
//!
//! - `lookups` - Cached filter options read from parent collections

pub mod lookups;

pub use lookups::LookupCache;
