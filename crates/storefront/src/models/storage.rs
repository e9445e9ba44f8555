//! Tenant-scoped visitor storage.
//!
//! Wraps the server-side session so that every key is prefixed with the
//! tenant slug. Two storefronts open in the same browser share one session
//! cookie but never read each other's state.

use orchard_core::{ShippingLocation, StorageKey, TenantSlug};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use super::session::{AuthUser, GuestUser, OtpState};
use crate::checkout::CheckoutSession;

/// Error type for session reads and writes.
pub type StorageError = tower_sessions::session::Error;

/// Session storage scoped to one tenant.
#[derive(Clone)]
pub struct TenantStorage {
    session: Session,
    tenant: TenantSlug,
}

impl TenantStorage {
    #[must_use]
    pub const fn new(session: Session, tenant: TenantSlug) -> Self {
        Self { session, tenant }
    }

    #[must_use]
    pub const fn tenant(&self) -> &TenantSlug {
        &self.tenant
    }

    /// Read a value stored under `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or the value does not
    /// deserialize.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: StorageKey,
    ) -> Result<Option<T>, StorageError> {
        self.session.get(&self.tenant.key(kind)).await
    }

    /// Store a value under `kind`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set<T: Serialize + Sync>(
        &self,
        kind: StorageKey,
        value: &T,
    ) -> Result<(), StorageError> {
        self.session.insert(&self.tenant.key(kind), value).await
    }

    /// Remove the value under `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn remove(&self, kind: StorageKey) -> Result<(), StorageError> {
        self.session
            .remove::<serde_json::Value>(&self.tenant.key(kind))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.get(StorageKey::AccessToken).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn auth_user(&self) -> Result<Option<AuthUser>, StorageError> {
        self.get(StorageKey::AuthUser).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn guest_user(&self) -> Result<Option<GuestUser>, StorageError> {
        self.get(StorageKey::GuestUser).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn location(&self) -> Result<Option<ShippingLocation>, StorageError> {
        self.get(StorageKey::Location).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn otp(&self) -> Result<Option<OtpState>, StorageError> {
        self.get(StorageKey::Otp).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn checkout(&self) -> Result<Option<CheckoutSession>, StorageError> {
        self.get(StorageKey::Checkout).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_checkout(&self, checkout: &CheckoutSession) -> Result<(), StorageError> {
        self.set(StorageKey::Checkout, checkout).await
    }

    /// Store the tokens and profile of a signed-in shopper.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn sign_in(&self, access_token: &str, user: &AuthUser) -> Result<(), StorageError> {
        self.set(StorageKey::AccessToken, &access_token).await?;
        self.set(StorageKey::AuthUser, user).await?;
        self.remove(StorageKey::GuestUser).await
    }

    /// Forget the shopper's identity and checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn sign_out(&self) -> Result<(), StorageError> {
        for kind in [
            StorageKey::AccessToken,
            StorageKey::AuthUser,
            StorageKey::GuestUser,
            StorageKey::Checkout,
            StorageKey::Otp,
        ] {
            self.remove(kind).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use orchard_core::{Email, UserId};
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn user() -> AuthUser {
        AuthUser {
            id: UserId::new(1),
            email: Email::parse("sam@example.com").unwrap(),
            name: "Sam".to_string(),
        }
    }

    #[tokio::test]
    async fn test_keys_are_isolated_per_tenant() {
        let session = session();
        let acme = TenantStorage::new(session.clone(), TenantSlug::parse("acme").unwrap());
        let globex = TenantStorage::new(session.clone(), TenantSlug::parse("globex").unwrap());

        acme.sign_in("tok_acme", &user()).await.unwrap();

        assert_eq!(acme.access_token().await.unwrap().as_deref(), Some("tok_acme"));
        assert_eq!(globex.access_token().await.unwrap(), None);

        let raw: Option<String> = session.get("acme_access_token").await.unwrap();
        assert_eq!(raw.as_deref(), Some("tok_acme"));
    }

    #[tokio::test]
    async fn test_sign_in_replaces_guest_and_sign_out_clears() {
        let storage = TenantStorage::new(session(), TenantSlug::parse("acme").unwrap());
        storage
            .set(
                StorageKey::GuestUser,
                &GuestUser {
                    email: Email::parse("guest@example.com").unwrap(),
                    name: "Guest".to_string(),
                },
            )
            .await
            .unwrap();

        storage.sign_in("tok", &user()).await.unwrap();
        assert_eq!(storage.guest_user().await.unwrap(), None);
        assert_eq!(storage.auth_user().await.unwrap(), Some(user()));

        storage
            .save_checkout(&CheckoutSession::new("cart-1"))
            .await
            .unwrap();
        storage.sign_out().await.unwrap();
        assert_eq!(storage.auth_user().await.unwrap(), None);
        assert_eq!(storage.access_token().await.unwrap(), None);
        assert_eq!(storage.checkout().await.unwrap(), None);
    }
}
