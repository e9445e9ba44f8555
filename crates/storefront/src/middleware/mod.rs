//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting (governor), per route group
//!
//! Handlers then use the extractors from [`tenant`] and [`auth`] to reach
//! tenant-scoped session storage.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod tenant;

pub use auth::RequireShopper;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use tenant::{CurrentTenant, Storage};
