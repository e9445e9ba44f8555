//! Session-related types.
//!
//! Types stored in the session under tenant-scoped keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orchard_core::{Email, UserId};

use crate::api::UserProfile;

/// Seconds after an OTP send during which resending is refused.
pub const OTP_RESEND_COOLDOWN_SECS: i64 = 60;

/// Session-stored identity of a logged-in shopper (`{tenant}_auth_user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Remote user ID.
    pub id: UserId,
    /// Login email.
    pub email: Email,
    /// Display name.
    pub name: String,
}

impl From<&UserProfile> for AuthUser {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.display_name(),
        }
    }
}

/// Identity of a visitor who continued as guest (`{tenant}_guest_user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestUser {
    pub email: Email,
    pub name: String,
}

/// Last OTP send (`{tenant}_otp`), backing the resend cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpState {
    /// Address the code was sent to.
    pub email: Email,
    /// When the code was last sent.
    pub sent_at: DateTime<Utc>,
}

impl OtpState {
    /// Record a send at `now`.
    #[must_use]
    pub const fn sent(email: Email, now: DateTime<Utc>) -> Self {
        Self { email, sent_at: now }
    }

    /// Whole seconds left before a resend is allowed, counting down to 0.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.sent_at).num_seconds();
        let remaining = (OTP_RESEND_COOLDOWN_SECS - elapsed).clamp(0, OTP_RESEND_COOLDOWN_SECS);
        u64::try_from(remaining).unwrap_or(0)
    }

    /// Whether a resend is allowed at `now`.
    #[must_use]
    pub fn can_resend(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    /// Status for the client's countdown.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> OtpStatus {
        let remaining_secs = self.remaining_secs(now);
        OtpStatus {
            email: self.email.clone(),
            remaining_secs,
            can_resend: remaining_secs == 0,
        }
    }
}

/// Resend countdown as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpStatus {
    pub email: Email,
    pub remaining_secs: u64,
    pub can_resend: bool,
}
