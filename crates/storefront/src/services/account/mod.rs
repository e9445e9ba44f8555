//! Account identification service.
//!
//! Resolves who is checking out: a returning shopper (password or one-time
//! code), or a guest. Tokens and profiles are written to tenant-scoped
//! session keys, and an in-progress checkout has its account step completed
//! with the new identity.

mod error;

pub use error::AccountError;

use chrono::{DateTime, Utc};
use orchard_core::{Email, StorageKey};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::api::{ApiClient, AuthResponse, EmailStatus};
use crate::checkout::CheckoutUser;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{AuthUser, GuestUser, OtpState, OtpStatus, TenantStorage};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Accepted one-time code lengths.
const OTP_LENGTH: std::ops::RangeInclusive<usize> = 4..=8;

/// Account identification service.
pub struct AccountService<'a> {
    api: &'a ApiClient,
    storage: &'a TenantStorage,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(api: &'a ApiClient, storage: &'a TenantStorage) -> Self {
        Self { api, storage }
    }

    /// Look up the state of an account by email.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` for a malformed address, or an API
    /// error.
    #[instrument(skip(self))]
    pub async fn check_email(&self, email: &str) -> Result<EmailStatus, AccountError> {
        let email = Email::parse(email)?;
        Ok(self.api.check_email(self.storage.tenant(), &email).await?)
    }

    // =========================================================================
    // Password
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an API error when the credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, AccountError> {
        let email = Email::parse(email)?;
        let auth = self
            .api
            .login(self.storage.tenant(), &email, password)
            .await?;
        self.sign_in(&auth).await
    }

    /// Start a password reset. The API emails a one-time code, which starts
    /// the resend cooldown.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed email or a failed API call.
    #[instrument(skip(self, now))]
    pub async fn request_password_reset(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpStatus, AccountError> {
        let email = Email::parse(email)?;
        self.api
            .request_password_reset(self.storage.tenant(), &email)
            .await?;
        self.record_send(email, now).await
    }

    /// Set a new password with the one-time code from a reset.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::WeakPassword` or `AccountError::InvalidOtp`
    /// before calling the API, or an API error.
    #[instrument(skip(self, otp, password))]
    pub async fn set_password(
        &self,
        email: &str,
        otp: &str,
        password: &SecretString,
    ) -> Result<(), AccountError> {
        let email = Email::parse(email)?;
        let otp = validate_otp(otp)?;
        validate_password(password.expose_secret())?;
        self.api
            .set_password(self.storage.tenant(), &email, otp, password)
            .await?;
        self.storage.remove(StorageKey::Otp).await?;
        Ok(())
    }

    // =========================================================================
    // One-time codes
    // =========================================================================

    /// Send a one-time login code.
    ///
    /// Asking again for the same address inside the cooldown is refused like
    /// a resend; a different address may be used at any time.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CooldownActive` for a repeat inside the window,
    /// or an error for a malformed email or a failed API call.
    #[instrument(skip(self, now))]
    pub async fn issue_otp(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpStatus, AccountError> {
        let email = Email::parse(email)?;
        if let Some(state) = self.storage.otp().await?
            && state.email == email
        {
            let remaining_secs = state.remaining_secs(now);
            if remaining_secs > 0 {
                return Err(AccountError::CooldownActive { remaining_secs });
            }
        }

        self.api.request_otp(self.storage.tenant(), &email).await?;
        self.record_send(email, now).await
    }

    /// Resend the one-time code.
    ///
    /// Refused without calling the API while the cooldown is running.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CooldownActive` inside the window,
    /// `AccountError::OtpNotRequested` if no code was sent, or an API error.
    #[instrument(skip(self, now))]
    pub async fn resend_otp(&self, now: DateTime<Utc>) -> Result<OtpStatus, AccountError> {
        let state = self.storage.otp().await?.ok_or(AccountError::OtpNotRequested)?;

        let remaining_secs = state.remaining_secs(now);
        if remaining_secs > 0 {
            return Err(AccountError::CooldownActive { remaining_secs });
        }

        self.api
            .resend_otp(self.storage.tenant(), &state.email)
            .await?;
        self.record_send(state.email, now).await
    }

    /// Current resend countdown, if a code was sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn otp_status(&self, now: DateTime<Utc>) -> Result<Option<OtpStatus>, AccountError> {
        Ok(self.storage.otp().await?.map(|state| state.status(now)))
    }

    /// Log in with a one-time code.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidOtp` for a malformed code, or an API error
    /// when the code is rejected.
    #[instrument(skip(self, otp))]
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthUser, AccountError> {
        let email = Email::parse(email)?;
        let otp = validate_otp(otp)?;
        let auth = self
            .api
            .verify_otp(self.storage.tenant(), &email, otp)
            .await?;
        self.storage.remove(StorageKey::Otp).await?;
        self.sign_in(&auth).await
    }

    // =========================================================================
    // Guest / logout
    // =========================================================================

    /// Continue without an account.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed email or blank name.
    #[instrument(skip(self))]
    pub async fn continue_as_guest(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GuestUser, AccountError> {
        let email = Email::parse(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::MissingName);
        }

        let guest = GuestUser {
            email,
            name: name.to_string(),
        };
        self.storage.set(StorageKey::GuestUser, &guest).await?;
        self.identify_checkout(CheckoutUser {
            email: guest.email.clone(),
            name: guest.name.clone(),
            is_guest: true,
        })
        .await?;

        tracing::info!(tenant = %self.storage.tenant(), "Continuing as guest");
        Ok(guest)
    }

    /// Forget the shopper and their checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout(&self) -> Result<(), AccountError> {
        self.storage.sign_out().await?;
        clear_sentry_user();
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn sign_in(&self, auth: &AuthResponse) -> Result<AuthUser, AccountError> {
        let user = AuthUser::from(&auth.user);
        self.storage.sign_in(&auth.access_token, &user).await?;
        set_sentry_user(&user.id, Some(user.email.as_str()));

        self.identify_checkout(CheckoutUser {
            email: user.email.clone(),
            name: user.name.clone(),
            is_guest: false,
        })
        .await?;

        tracing::info!(tenant = %self.storage.tenant(), user_id = %user.id, "Shopper signed in");
        Ok(user)
    }

    /// Complete the account step of an open checkout.
    async fn identify_checkout(&self, user: CheckoutUser) -> Result<(), AccountError> {
        let Some(mut checkout) = self.storage.checkout().await? else {
            return Ok(());
        };
        if checkout.order().is_some() {
            return Ok(());
        }
        checkout.complete_account(user)?;
        self.storage.save_checkout(&checkout).await?;
        Ok(())
    }

    async fn record_send(
        &self,
        email: Email,
        now: DateTime<Utc>,
    ) -> Result<OtpStatus, AccountError> {
        let state = OtpState::sent(email, now);
        self.storage.set(StorageKey::Otp, &state).await?;
        Ok(state.status(now))
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trim a one-time code and check its shape.
fn validate_otp(otp: &str) -> Result<&str, AccountError> {
    let otp = otp.trim();
    if !OTP_LENGTH.contains(&otp.len()) || !otp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AccountError::InvalidOtp);
    }
    Ok(otp)
}
