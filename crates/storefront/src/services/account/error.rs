//! Account error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::models::StorageError;

/// Errors that can occur during account identification.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] orchard_core::EmailError),

    /// Password too short or otherwise unacceptable.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Guest name missing.
    #[error("name is required")]
    MissingName,

    /// One-time code missing or malformed.
    #[error("one-time code is invalid")]
    InvalidOtp,

    /// An OTP was resent inside the cooldown window.
    #[error("please wait {remaining_secs} seconds before requesting another code")]
    CooldownActive { remaining_secs: u64 },

    /// Resend requested before any code was sent.
    #[error("no one-time code has been requested")]
    OtpNotRequested,

    /// Remote API error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store error.
    #[error("session error: {0}")]
    Storage(#[from] StorageError),

    /// Updating the checkout with the new identity failed.
    #[error("checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}
