//! # civic-accounts (Contributor accounts & notifications)
//!
//! `civic-accounts` owns the contributor profile of the civic-engagement platform
//! and the two outbound notification flows attached to it: email verification and
//! password reset.
//!
//! ## Profile Model
//!
//! A [`Contributor`](accounts::Contributor) extends a base
//! [`Identity`](accounts::Identity) by composition. Exactly one profile exists per
//! identity, and `email_verified` only ever moves from `false` to `true`.
//!
//! ## Collaborators
//!
//! The profile logic never talks to a database, a token scheme or a mail transport
//! directly. It goes through three traits:
//!
//! - [`IdentityStore`](store::IdentityStore): `PostgreSQL` or in-memory records.
//! - [`TokenService`](token::TokenService): state-bound, time-limited tokens.
//! - [`MailGateway`](mail::MailGateway): SMTP delivery or a logging stub.
//!
//! Failures from the store (record-not-found) and the gateway (delivery) surface
//! unchanged to the caller; nothing is retried inside the component.

pub mod accounts;
pub mod api;
pub mod cli;
pub mod frontend;
pub mod mail;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
