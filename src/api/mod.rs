use crate::{
    accounts::{Accounts, AccountsConfig},
    mail::{MailGateway, Mailer},
    store::{IdentityStore, PgIdentityStore},
    token::{HmacTokenGenerator, TokenService},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

use handlers::{health, password_reset, verification};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the router for an accounts component, whatever its collaborators.
pub fn router<S, T, M>(accounts: Arc<Accounts<S, T, M>>) -> Router
where
    S: IdentityStore + 'static,
    T: TokenService + 'static,
    M: MailGateway + 'static,
{
    Router::new()
        .route("/health", get(health::health::<S, T, M>))
        .route(
            "/v1/contributors/me/verification-email",
            post(verification::send_verification_email::<S, T, M>),
        )
        .route(
            "/v1/password-reset",
            post(password_reset::request_password_reset::<S, T, M>),
        )
        .route(
            "/verify_user/:id/:token",
            get(verification::verify_user::<S, T, M>),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(accounts)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    config: AccountsConfig,
    tokens: HmacTokenGenerator,
    mailer: Mailer,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let accounts = Arc::new(Accounts::new(
        config,
        PgIdentityStore::new(pool),
        tokens,
        mailer,
    ));

    let app = router(accounts);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
