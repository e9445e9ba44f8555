//! Authentication extractors.
//!
//! Provides an extractor for routes that need a signed-in shopper, such as
//! the address book.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::tenant::Storage;
use crate::error::AppError;
use crate::models::{AuthUser, TenantStorage};

/// Extractor that requires a signed-in shopper for the path's tenant.
///
/// Rejects with 401 if no access token is stored for the tenant. A shopper
/// signed in to one tenant is anonymous to every other.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(shopper: RequireShopper) -> String {
///     format!("Hello, {}!", shopper.user.name)
/// }
/// ```
pub struct RequireShopper {
    pub storage: TenantStorage,
    pub access_token: String,
    pub user: AuthUser,
}

impl<S> FromRequestParts<S> for RequireShopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Storage(storage) = Storage::from_request_parts(parts, state).await?;

        let access_token = storage
            .access_token()
            .await?
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))?;
        let user = storage
            .auth_user()
            .await?
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))?;

        Ok(Self {
            storage,
            access_token,
            user,
        })
    }
}
