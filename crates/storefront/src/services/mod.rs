//! Business logic services for storefront.
//!
//! # Services
//!
//! - `account` - Shopper identification (password, one-time codes, guest)
//! - `checkout` - Checkout steps backed by the commerce API
//!
//! Services borrow the API client and the tenant's session storage for the
//! duration of one request.

pub mod account;
pub mod checkout;
