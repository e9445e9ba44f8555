//! Visitor state kept between requests.
//!
//! Everything here lives in the server-side session under
//! `{tenant}_{suffix}` keys; business records stay with the remote API.

pub mod session;
pub mod storage;

pub use session::{AuthUser, GuestUser, OTP_RESEND_COOLDOWN_SECS, OtpState, OtpStatus};
pub use storage::{StorageError, TenantStorage};
