//! Email verification endpoints.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use super::caller_username;
use crate::accounts::{Accounts, Error};
use crate::frontend::{section_url, FrontEndSection};
use crate::mail::MailGateway;
use crate::store::IdentityStore;
use crate::token::TokenService;

/// Send (or resend) the verification email to the authenticated caller.
#[utoipa::path(
    post,
    path = "/v1/contributors/me/verification-email",
    params(
        ("x-remote-user" = String, Header, description = "Username authenticated by the proxy")
    ),
    responses(
        (status = 204, description = "Verification email sent"),
        (status = 401, description = "No authenticated contributor", body = String),
        (status = 500, description = "Lookup or delivery failed", body = String)
    ),
    tag = "verification"
)]
#[instrument(skip_all)]
pub async fn send_verification_email<S, T, M>(
    headers: HeaderMap,
    accounts: Extension<Arc<Accounts<S, T, M>>>,
) -> impl IntoResponse
where
    S: IdentityStore + 'static,
    T: TokenService + 'static,
    M: MailGateway + 'static,
{
    let caller = caller_username(&headers);
    let contributor = match accounts.get_request_contributor(caller.as_deref()).await {
        Ok(Some(contributor)) => contributor,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to look up contributor: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification email failed".to_string(),
            )
                .into_response();
        }
    };

    match accounts.send_verification_email(&contributor).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!(
                delivery = err.is_delivery_failure(),
                "Failed to send verification email: {err}"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification email failed".to_string(),
            )
                .into_response()
        }
    }
}

/// Consume the link from the verification email and mark the address verified.
#[utoipa::path(
    get,
    path = "/verify_user/{id}/{token}",
    params(
        ("id" = Uuid, Path, description = "Contributor id"),
        ("token" = String, Path, description = "Verification token")
    ),
    responses(
        (status = 303, description = "Verified, redirect to the front-end"),
        (status = 400, description = "Invalid or expired token", body = String),
        (status = 404, description = "Unknown contributor", body = String),
        (status = 500, description = "Verified, but the redirect could not be built", body = String)
    ),
    tag = "verification"
)]
#[instrument(skip_all)]
pub async fn verify_user<S, T, M>(
    Path((id, token)): Path<(Uuid, String)>,
    accounts: Extension<Arc<Accounts<S, T, M>>>,
) -> impl IntoResponse
where
    S: IdentityStore + 'static,
    T: TokenService + 'static,
    M: MailGateway + 'static,
{
    match accounts.confirm_email(id, &token).await {
        Ok(true) => {
            match section_url(
                accounts.config().protocol_domain(),
                FrontEndSection::EmailVerified,
                &[],
            ) {
                Ok(url) => Redirect::to(url.as_str()).into_response(),
                Err(err) => {
                    error!("Failed to build email-verified redirect: {err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Verification redirect failed".to_string(),
                    )
                        .into_response()
                }
            }
        }
        Ok(false) => (StatusCode::BAD_REQUEST, "Invalid token".to_string()).into_response(),
        Err(Error::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to verify email: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}
