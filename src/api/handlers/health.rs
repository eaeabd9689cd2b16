use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::accounts::Accounts;
use crate::mail::MailGateway;
use crate::store::IdentityStore;
use crate::token::TokenService;
use crate::GIT_COMMIT_HASH;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Identity store is reachable", body = [Health]),
        (status = 503, description = "Identity store is unreachable", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health<S, T, M>(accounts: Extension<Arc<Accounts<S, T, M>>>) -> impl IntoResponse
where
    S: IdentityStore + 'static,
    T: TokenService + 'static,
    M: MailGateway + 'static,
{
    let (status, database) = match accounts.store().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            error!("Failed to ping identity store: {err}");

            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let body = Json(Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    });

    let short_hash = GIT_COMMIT_HASH.get(0..7).unwrap_or("");

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    )) {
        headers.insert("X-App", value);
    }

    (status, headers, body)
}
