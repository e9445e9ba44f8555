//! Account identification route handlers.
//!
//! JSON endpoints behind the checkout's account step. The router layers a
//! strict per-IP rate limiter over all of them.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::EmailStatus;
use crate::error::Result;
use crate::models::{AuthUser, GuestUser, OtpStatus};
use crate::middleware::Storage;
use crate::services::account::AccountService;
use crate::state::AppState;

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Password login form. `Debug` is not derived so the password never
/// reaches logs.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct GuestRequest {
    pub email: String,
    pub name: String,
}

/// Identity after a successful sign-in.
#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub user: AuthUser,
}

/// Resend countdown, or nothing if no code was sent.
#[derive(Debug, Serialize)]
pub struct OtpStatusResponse {
    pub otp: Option<OtpStatus>,
}

// =============================================================================
// Handlers
// =============================================================================

#[instrument(skip(state, storage, body))]
pub async fn check_email(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<EmailRequest>,
) -> Result<Json<EmailStatus>> {
    let status = AccountService::new(state.api(), &storage)
        .check_email(&body.email)
        .await?;
    Ok(Json(status))
}

#[instrument(skip(state, storage, body))]
pub async fn login(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SignedIn>> {
    let user = AccountService::new(state.api(), &storage)
        .login(&body.email, &body.password)
        .await?;
    Ok(Json(SignedIn { user }))
}

/// Send a one-time login code.
#[instrument(skip(state, storage, body))]
pub async fn request_otp(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<EmailRequest>,
) -> Result<Json<OtpStatus>> {
    let status = AccountService::new(state.api(), &storage)
        .issue_otp(&body.email, Utc::now())
        .await?;
    Ok(Json(status))
}

/// Resend the code. Refused with 429 inside the cooldown.
#[instrument(skip(state, storage))]
pub async fn resend_otp(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<OtpStatus>> {
    let status = AccountService::new(state.api(), &storage)
        .resend_otp(Utc::now())
        .await?;
    Ok(Json(status))
}

pub async fn otp_status(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<OtpStatusResponse>> {
    let otp = AccountService::new(state.api(), &storage)
        .otp_status(Utc::now())
        .await?;
    Ok(Json(OtpStatusResponse { otp }))
}

#[instrument(skip(state, storage, body))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<SignedIn>> {
    let user = AccountService::new(state.api(), &storage)
        .verify_otp(&body.email, &body.otp)
        .await?;
    Ok(Json(SignedIn { user }))
}

#[instrument(skip(state, storage, body))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<EmailRequest>,
) -> Result<Json<OtpStatus>> {
    let status = AccountService::new(state.api(), &storage)
        .request_password_reset(&body.email, Utc::now())
        .await?;
    Ok(Json(status))
}

#[instrument(skip(state, storage, body))]
pub async fn set_password(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<SetPasswordRequest>,
) -> Result<StatusCode> {
    AccountService::new(state.api(), &storage)
        .set_password(&body.email, &body.otp, &body.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, storage, body))]
pub async fn guest(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<GuestRequest>,
) -> Result<Json<GuestUser>> {
    let guest = AccountService::new(state.api(), &storage)
        .continue_as_guest(&body.email, &body.name)
        .await?;
    Ok(Json(guest))
}

pub async fn logout(State(state): State<AppState>, Storage(storage): Storage) -> Result<Response> {
    AccountService::new(state.api(), &storage).logout().await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
