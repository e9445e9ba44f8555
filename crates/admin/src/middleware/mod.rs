//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request span with `request_id` and `tenant` fields)
//! 3. Request ID (fresh UUID per request)
//!
//! The tenant is resolved per handler by the [`CurrentTenant`] extractor.

pub mod request_id;
pub mod tenant;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use tenant::CurrentTenant;
