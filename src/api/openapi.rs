use utoipa::OpenApi;

use super::handlers::{health, password_reset, verification};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        verification::send_verification_email,
        verification::verify_user,
        password_reset::request_password_reset,
    ),
    components(schemas(health::Health, password_reset::PasswordResetRequest)),
    tags(
        (name = "health", description = "Service health"),
        (name = "verification", description = "Email verification"),
        (name = "password", description = "Password reset"),
    )
)]
struct ApiDoc;

/// OpenAPI document served at `/api-docs/openapi.json`.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
