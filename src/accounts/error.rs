use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the contributor component and its collaborators.
///
/// `NotFound` comes from the identity store, the address/build/delivery variants
/// come from the mail gateway. Neither is retried or translated on the way up.
#[derive(Debug, Error)]
pub enum Error {
    #[error("contributor not found: {0}")]
    NotFound(Uuid),
    #[error("contributor already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid contributor profile: {0}")]
    InvalidProfile(String),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),
    #[error("mail delivery failed: {0}")]
    Delivery(#[from] lettre::transport::smtp::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid token key")]
    TokenKey(#[from] hmac::digest::InvalidLength),
}

impl Error {
    /// True for failures raised by the mail gateway.
    #[must_use]
    pub fn is_delivery_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_) | Self::MessageBuild(_) | Self::Delivery(_)
        )
    }
}
