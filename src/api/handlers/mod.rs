pub mod health;
pub mod password_reset;
pub mod verification;

use axum::http::HeaderMap;

/// Header carrying the username authenticated by the proxy in front of the service.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Caller identity exactly as forwarded by the authenticating proxy, if any.
pub(crate) fn caller_username(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REMOTE_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
