//! Tenant slugs and tenant-scoped storage keys.
//!
//! Every storefront request belongs to exactly one tenant. Visitor state that
//! survives between requests is stored under keys prefixed with the tenant
//! slug (`{tenant}_access_token`, `{tenant}_guest_user`, ...) so that two
//! storefronts open in the same browser never see each other's state.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TenantSlug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TenantError {
    /// The slug is empty.
    #[error("tenant slug cannot be empty")]
    Empty,
    /// The slug is longer than [`TenantSlug::MAX_LENGTH`].
    #[error("tenant slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains a character outside `[a-z0-9-]`.
    #[error("tenant slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
    /// The slug starts or ends with a hyphen.
    #[error("tenant slug cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// A tenant identifier as it appears in URLs and storage keys.
///
/// ```
/// use orchard_core::{StorageKey, TenantSlug};
///
/// let tenant = TenantSlug::parse("green-grocer").unwrap();
/// assert_eq!(tenant.key(StorageKey::AccessToken), "green-grocer_access_token");
/// assert!(TenantSlug::parse("Green Grocer").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSlug(String);

impl TenantSlug {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 63;

    /// Parse a tenant slug.
    ///
    /// # Errors
    ///
    /// Returns a [`TenantError`] if the slug is empty, too long, contains
    /// characters other than lowercase ASCII letters, digits and hyphens, or
    /// starts/ends with a hyphen.
    pub fn parse(s: &str) -> Result<Self, TenantError> {
        if s.is_empty() {
            return Err(TenantError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TenantError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(TenantError::InvalidCharacter);
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(TenantError::EdgeHyphen);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the storage key for `kind` scoped to this tenant.
    #[must_use]
    pub fn key(&self, kind: StorageKey) -> String {
        format!("{}_{}", self.0, kind.suffix())
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantSlug {
    type Error = TenantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantSlug> for String {
    fn from(slug: TenantSlug) -> Self {
        slug.0
    }
}

/// Kinds of per-visitor state stored under tenant-scoped keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Access token issued by the authentication API.
    AccessToken,
    /// Profile of the authenticated user.
    AuthUser,
    /// Identity of a visitor who continued as guest.
    GuestUser,
    /// Last-known shipping location, used for deliverability checks.
    Location,
    /// In-progress checkout session.
    Checkout,
    /// Timestamp of the last OTP send, used for the resend cooldown.
    Otp,
}

impl StorageKey {
    /// The key suffix appended after `{tenant}_`.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::AuthUser => "auth_user",
            Self::GuestUser => "guest_user",
            Self::Location => "location",
            Self::Checkout => "checkout",
            Self::Otp => "otp",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_slugs() {
        assert!(TenantSlug::parse("acme").is_ok());
        assert!(TenantSlug::parse("acme-2").is_ok());
        assert!(TenantSlug::parse("7eleven").is_ok());
    }

    #[test]
    fn test_parse_invalid_slugs() {
        assert_eq!(TenantSlug::parse(""), Err(TenantError::Empty));
        assert_eq!(TenantSlug::parse("Acme"), Err(TenantError::InvalidCharacter));
        assert_eq!(TenantSlug::parse("ac_me"), Err(TenantError::InvalidCharacter));
        assert_eq!(TenantSlug::parse("-acme"), Err(TenantError::EdgeHyphen));
        assert!(matches!(
            TenantSlug::parse(&"a".repeat(64)),
            Err(TenantError::TooLong { .. })
        ));
    }

    #[test]
    fn test_storage_keys_are_tenant_scoped() {
        let tenant = TenantSlug::parse("acme").unwrap();
        assert_eq!(tenant.key(StorageKey::AccessToken), "acme_access_token");
        assert_eq!(tenant.key(StorageKey::AuthUser), "acme_auth_user");
        assert_eq!(tenant.key(StorageKey::GuestUser), "acme_guest_user");
        assert_eq!(tenant.key(StorageKey::Location), "acme_location");

        let other = TenantSlug::parse("globex").unwrap();
        assert_ne!(
            tenant.key(StorageKey::Checkout),
            other.key(StorageKey::Checkout)
        );
    }
}
