//! Account identification endpoints.

use orchard_core::{Email, TenantSlug, UserId};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// What the API knows about an email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailStatus {
    pub exists: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub has_password: bool,
}

/// Profile of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserProfile {
    /// Name to address the user by, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.to_string()
        } else {
            name
        }
    }
}

/// Tokens and profile returned by login and OTP verification.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: UserProfile,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Serialize)]
struct SetPasswordBody<'a> {
    email: &'a str,
    otp: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Look up whether an account exists for `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn check_email(
        &self,
        tenant: &TenantSlug,
        email: &Email,
    ) -> Result<EmailStatus, ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/check-email", None);
        self.send(&endpoint, req.json(&EmailBody { email: email.as_str() }))
            .await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, tenant, password), fields(tenant = %tenant))]
    pub async fn login(
        &self,
        tenant: &TenantSlug,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/login", None);
        let body = LoginBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.send(&endpoint, req.json(&body)).await
    }

    /// Ask the API to email a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn request_otp(&self, tenant: &TenantSlug, email: &Email) -> Result<(), ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/otp", None);
        self.send_empty(&endpoint, req.json(&EmailBody { email: email.as_str() }))
            .await
    }

    /// Ask the API to send the one-time code again.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn resend_otp(&self, tenant: &TenantSlug, email: &Email) -> Result<(), ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/otp/resend", None);
        self.send_empty(&endpoint, req.json(&EmailBody { email: email.as_str() }))
            .await
    }

    /// Exchange a one-time code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the request fails.
    #[instrument(skip(self, tenant, otp), fields(tenant = %tenant))]
    pub async fn verify_otp(
        &self,
        tenant: &TenantSlug,
        email: &Email,
        otp: &str,
    ) -> Result<AuthResponse, ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/otp/verify", None);
        let body = OtpBody {
            email: email.as_str(),
            otp,
        };
        self.send(&endpoint, req.json(&body)).await
    }

    /// Start a password reset; the API emails a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, tenant), fields(tenant = %tenant))]
    pub async fn request_password_reset(
        &self,
        tenant: &TenantSlug,
        email: &Email,
    ) -> Result<(), ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/password/reset", None);
        self.send_empty(&endpoint, req.json(&EmailBody { email: email.as_str() }))
            .await
    }

    /// Set a new password using a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the request fails.
    #[instrument(skip(self, tenant, otp, password), fields(tenant = %tenant))]
    pub async fn set_password(
        &self,
        tenant: &TenantSlug,
        email: &Email,
        otp: &str,
        password: &SecretString,
    ) -> Result<(), ApiError> {
        let (endpoint, req) = self.request(Method::POST, tenant, "auth/password", None);
        let body = SetPasswordBody {
            email: email.as_str(),
            otp,
            password: password.expose_secret(),
        };
        self.send_empty(&endpoint, req.json(&body)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, tenant};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> Email {
        Email::parse("shopper@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_check_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/acme/auth/check-email"))
            .and(body_json(serde_json::json!({ "email": "shopper@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "exists": true,
                "active": true,
                "verified": false,
                "has_password": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client_for(&server.uri())
            .check_email(&tenant(), &email())
            .await
            .unwrap();
        assert!(status.exists);
        assert!(status.has_password);
        assert!(!status.verified);
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/acme/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "message": "Invalid credentials" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .login(&tenant(), &email(), &SecretString::from("hunter2"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_verify_otp_returns_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/acme/auth/otp/verify"))
            .and(body_json(serde_json::json!({
                "email": "shopper@example.com",
                "otp": "123456"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok_abc",
                "user": { "id": 7, "email": "shopper@example.com", "first_name": "Sam" }
            })))
            .mount(&server)
            .await;

        let auth = client_for(&server.uri())
            .verify_otp(&tenant(), &email(), "123456")
            .await
            .unwrap();
        assert_eq!(auth.access_token, "tok_abc");
        assert_eq!(auth.user.display_name(), "Sam");
        assert!(!format!("{auth:?}").contains("tok_abc"));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let profile = UserProfile {
            id: UserId::new(1),
            email: email(),
            first_name: Some("  ".to_string()),
            last_name: None,
        };
        assert_eq!(profile.display_name(), "shopper@example.com");
    }
}
