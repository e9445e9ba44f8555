//! Unified error handling for admin.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured
//! to Sentry before responding; the body is always JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orchard_core::FieldError;
use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Service-management API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Submitted draft or patch failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

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
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// A 401/403 from the remote API means the service token is wrong,
    /// which is a server fault rather than the operator's.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) if err.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Api(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Api(err) if err.is_validation() || err.is_not_found() => ErrorBody {
                error: err.message().to_string(),
                fields: err.fields().to_vec(),
            },
            // Don't expose internal error details to clients
            Self::Api(_) => ErrorBody {
                error: "External service error".to_string(),
                fields: Vec::new(),
            },
            Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                fields: Vec::new(),
            },
            Self::Validation(fields) => ErrorBody {
                error: "Please correct the highlighted fields".to_string(),
                fields: fields.clone(),
            },
            Self::NotFound(_) | Self::BadRequest(_) => ErrorBody {
                error: self.to_string(),
                fields: Vec::new(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb recording an admin write.
pub fn add_write_breadcrumb(collection: &str, action: &str, id: Option<i64>) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some("admin".to_string()),
        message: Some(match id {
            Some(id) => format!("{action} {collection}/{id}"),
            None => format!("{action} {collection}"),
        }),
        level: sentry::Level::Info,
        ..Default::default()
    });
}
