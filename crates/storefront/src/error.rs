//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orchard_core::FieldError;
use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::models::StorageError;
use crate::services::account::AccountError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout step gate refused a transition.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Account identification failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] StorageError),

    /// Submitted form failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => api_status(err),
            Self::Checkout(err) => checkout_status(err),
            Self::Account(err) => match err {
                AccountError::InvalidEmail(_)
                | AccountError::WeakPassword(_)
                | AccountError::MissingName
                | AccountError::InvalidOtp => StatusCode::UNPROCESSABLE_ENTITY,
                AccountError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
                AccountError::OtpNotRequested => StatusCode::CONFLICT,
                AccountError::Api(err) => api_status(err),
                AccountError::Checkout(err) => checkout_status(err),
                AccountError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: self.to_string(),
            fields: Vec::new(),
            retry_after_secs: None,
        };

        // Don't expose internal error details to clients
        if self.status().is_server_error() {
            body.error = match self {
                Self::Api(_) | Self::Account(AccountError::Api(_)) => "External service error",
                _ => "Something went wrong, please try again",
            }
            .to_string();
            return body;
        }

        match self {
            Self::Api(err) | Self::Account(AccountError::Api(err)) => {
                body.error = api_message(err);
                body.fields = err.fields().to_vec();
            }
            Self::Checkout(err) | Self::Account(AccountError::Checkout(err)) => {
                body.error = err.to_string();
                if let CheckoutError::Validation(fields) = err {
                    body.fields.clone_from(fields);
                }
            }
            Self::Account(AccountError::CooldownActive { remaining_secs }) => {
                body.error = self.account_message();
                body.retry_after_secs = Some(*remaining_secs);
            }
            Self::Account(_) => body.error = self.account_message(),
            Self::Validation(fields) => {
                body.error = "Please correct the highlighted fields".to_string();
                body.fields.clone_from(fields);
            }
            Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::BadRequest(_)
            | Self::Session(_)
            | Self::Internal(_) => {}
        }

        body
    }

    fn account_message(&self) -> String {
        match self {
            Self::Account(AccountError::InvalidEmail(_)) => "Invalid email address".to_string(),
            Self::Account(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

const fn checkout_status(err: &CheckoutError) -> StatusCode {
    match err {
        CheckoutError::Validation(_) | CheckoutError::PaymentNotAllowed { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CheckoutError::StepNotReachable { .. }
        | CheckoutError::NotInBranch { .. }
        | CheckoutError::AlreadySubmitted
        | CheckoutError::NoPendingShipping
        | CheckoutError::Incomplete { .. } => StatusCode::CONFLICT,
    }
}

fn api_status(err: &ApiError) -> StatusCode {
    if err.is_unauthorized() {
        StatusCode::UNAUTHORIZED
    } else if err.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn api_message(err: &ApiError) -> String {
    if err.is_unauthorized() {
        "Your session has expired, please sign in again".to_string()
    } else {
        err.message().to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order placed", Some(&[("order_number", "1001")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
