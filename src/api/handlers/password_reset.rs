use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::accounts::{contributor::valid_email, Accounts};
use crate::mail::MailGateway;
use crate::store::IdentityStore;
use crate::token::TokenService;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Send a password reset email (always returns 204 to avoid user enumeration).
#[utoipa::path(
    post,
    path = "/v1/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 204, description = "Reset request accepted"),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "password"
)]
#[instrument(skip_all)]
pub async fn request_password_reset<S, T, M>(
    accounts: Extension<Arc<Accounts<S, T, M>>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> impl IntoResponse
where
    S: IdentityStore + 'static,
    T: TokenService + 'static,
    M: MailGateway + 'static,
{
    let request: PasswordResetRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = request.email.trim();
    if !valid_email(email) {
        return StatusCode::NO_CONTENT.into_response();
    }

    if let Err(err) = accounts.request_password_reset(email).await {
        // Keep the response opaque; the failure is only logged.
        error!("Failed to send password reset email: {err}");
    }

    StatusCode::NO_CONTENT.into_response()
}
