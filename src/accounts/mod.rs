//! Contributor profile operations: admin check, notification emails and lookups.
//!
//! Flow Overview: every notification re-fetches the canonical record from the
//! identity store, asks the token service for a token bound to that record, builds a
//! link, and hands a plain-text message to the mail gateway. Each step is awaited in
//! order and any failure is returned to the caller as-is.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::frontend::{section_url, verification_url, FrontEndSection};
use crate::mail::{EmailMessage, MailGateway};
use crate::store::IdentityStore;
use crate::token::TokenService;

mod config;
pub mod contributor;
mod error;
mod lookup;

pub use config::AccountsConfig;
pub use contributor::{Contributor, Identity, NewContributor};
pub use error::Error;
pub use lookup::{get_contributor_by_username, get_request_contributor};

pub const VERIFICATION_SUBJECT: &str = "Welcome to DemocracyLab";
pub const VERIFICATION_BODY: &str =
    "Click here to confirm your email address (or paste into your browser): ";
pub const PASSWORD_RESET_SUBJECT: &str = "DemocracyLab Password Reset";
pub const PASSWORD_RESET_BODY: &str = "Click here to change your password: ";

/// Log target for reset links; the subscriber keeps it at `info` whatever the verbosity.
pub const RESET_LINK_TARGET: &str = "civic_accounts::reset_links";

/// The contributor component wired to its three collaborators.
#[derive(Debug)]
pub struct Accounts<S, T, M> {
    config: AccountsConfig,
    store: S,
    tokens: T,
    mailer: M,
}

impl<S, T, M> Accounts<S, T, M>
where
    S: IdentityStore,
    T: TokenService,
    M: MailGateway,
{
    #[must_use]
    pub fn new(config: AccountsConfig, store: S, tokens: T, mailer: M) -> Self {
        Self {
            config,
            store,
            tokens,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AccountsConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn is_admin_contributor(&self, contributor: &Contributor) -> bool {
        contributor.is_admin_contributor(&self.config)
    }

    /// Email the contributor a link to `/verify_user/{id}/{token}`.
    ///
    /// # Errors
    /// `Error::NotFound` if the record no longer exists (nothing is sent), or the
    /// mail gateway's error if delivery fails.
    #[instrument(skip_all, fields(contributor_id = %contributor.id()))]
    pub async fn send_verification_email(&self, contributor: &Contributor) -> Result<(), Error> {
        let canonical = self.store.get(contributor.id()).await?;
        let token = self.tokens.make_token(&canonical.identity)?;
        let url = verification_url(self.config.protocol_domain(), contributor.id(), &token);

        let message = EmailMessage::new(
            VERIFICATION_SUBJECT,
            format!("{VERIFICATION_BODY}{url}"),
            self.config.email_from(),
            contributor.email(),
        );
        self.mailer.send(&message).await?;

        info!("verification email sent");
        Ok(())
    }

    /// Email the contributor a link to the front-end change-password section.
    ///
    /// # Errors
    /// `Error::NotFound` if the record no longer exists (nothing is sent), or the
    /// mail gateway's error if delivery fails.
    #[instrument(skip_all, fields(contributor_id = %contributor.id()))]
    pub async fn send_password_reset_email(&self, contributor: &Contributor) -> Result<(), Error> {
        let canonical = self.store.get(contributor.id()).await?;
        let token = self.tokens.make_token(&canonical.identity)?;
        let user_id = contributor.id().to_string();
        let url = section_url(
            self.config.protocol_domain(),
            FrontEndSection::ChangePassword,
            &[("userId", user_id.as_str()), ("token", token.as_str())],
        )?;

        if self.config.log_reset_links() {
            info!(target: RESET_LINK_TARGET, reset_url = %url, "password reset link");
        }

        let message = EmailMessage::new(
            PASSWORD_RESET_SUBJECT,
            format!("{PASSWORD_RESET_BODY}{url}"),
            self.config.email_from(),
            contributor.email(),
        );
        self.mailer.send(&message).await?;

        info!("password reset email sent");
        Ok(())
    }

    /// Send a reset email when `email` belongs to a contributor, do nothing otherwise.
    ///
    /// # Errors
    /// Store or delivery failures for an existing contributor.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), Error> {
        match self.get_contributor_by_username(email).await? {
            Some(contributor) => self.send_password_reset_email(&contributor).await,
            None => Ok(()),
        }
    }

    /// Consume a verification link. Returns `Ok(false)` for a bad or expired token.
    ///
    /// # Errors
    /// `Error::NotFound` for an unknown id, or a store failure.
    #[instrument(skip(self, token))]
    pub async fn confirm_email(&self, id: Uuid, token: &str) -> Result<bool, Error> {
        let contributor = self.store.get(id).await?;
        if !self.tokens.check_token(&contributor.identity, token) {
            return Ok(false);
        }

        if !contributor.email_verified {
            self.store.mark_email_verified(id).await?;
            info!("email verified");
        }
        Ok(true)
    }

    /// # Errors
    /// Store failures only; absence is `Ok(None)`.
    pub async fn get_contributor_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Contributor>, Error> {
        get_contributor_by_username(&self.store, username).await
    }

    /// # Errors
    /// Store failures only; absence is `Ok(None)`.
    pub async fn get_request_contributor(
        &self,
        caller: Option<&str>,
    ) -> Result<Option<Contributor>, Error> {
        get_request_contributor(&self.store, caller).await
    }
}

#[cfg(test)]
mod tests {
    use super::contributor::tests::new_contributor;
    use super::*;
    use crate::store::MemoryIdentityStore;
    use crate::token::HmacTokenGenerator;
    use secrecy::SecretString;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingMailer {
        sent: Arc<Mutex<Vec<EmailMessage>>>,
        fail: bool,
    }

    impl MailGateway for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
            if self.fail {
                return Err(Error::InvalidAddress(message.to.join(",")));
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    /// Token service that hands out a fixed token.
    struct FixedTokens;

    impl TokenService for FixedTokens {
        fn make_token(&self, _identity: &Identity) -> Result<String, Error> {
            Ok("1a2b-cafe".to_string())
        }

        fn check_token(&self, _identity: &Identity, token: &str) -> bool {
            token == "1a2b-cafe"
        }
    }

    fn config() -> AccountsConfig {
        AccountsConfig::new(
            "https://democracylab.test".to_string(),
            "hello@democracylab.test".to_string(),
        )
        .with_admin_email("admin@democracylab.test".to_string())
    }

    fn accounts(
        mailer: RecordingMailer,
    ) -> Accounts<MemoryIdentityStore, FixedTokens, RecordingMailer> {
        Accounts::new(config(), MemoryIdentityStore::new(), FixedTokens, mailer)
    }

    #[tokio::test]
    async fn verification_email_links_domain_id_and_token() -> Result<(), Error> {
        let mailer = RecordingMailer::default();
        let accounts = accounts(mailer.clone());
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;

        accounts.send_verification_email(&contributor).await?;

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.subject, VERIFICATION_SUBJECT);
        assert_eq!(message.from, "hello@democracylab.test");
        assert_eq!(message.to, vec!["ada@democracylab.test".to_string()]);
        assert_eq!(
            message.body,
            format!(
                "{VERIFICATION_BODY}https://democracylab.test/verify_user/{}/1a2b-cafe",
                contributor.id()
            )
        );
        Ok(())
    }

    #[tokio::test]
    async fn verification_for_vanished_record_sends_nothing() -> Result<(), Error> {
        let mailer = RecordingMailer::default();
        let accounts = accounts(mailer.clone());
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;
        accounts.store().remove(contributor.id()).await;

        let result = accounts.send_verification_email(&contributor).await;
        assert!(matches!(result, Err(Error::NotFound(id)) if id == contributor.id()));
        assert!(mailer.sent.lock().await.is_empty());

        let result = accounts.send_password_reset_email(&contributor).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(mailer.sent.lock().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delivery_failure_propagates() -> Result<(), Error> {
        let mailer = RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        };
        let accounts = accounts(mailer);
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;

        let result = accounts.send_verification_email(&contributor).await;
        assert!(result.is_err_and(|err| err.is_delivery_failure()));
        Ok(())
    }

    #[tokio::test]
    async fn password_reset_links_change_password_section() -> Result<(), Error> {
        let mailer = RecordingMailer::default();
        let accounts = accounts(mailer.clone());
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;

        accounts.send_password_reset_email(&contributor).await?;

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, PASSWORD_RESET_SUBJECT);
        assert_eq!(sent[0].to, vec!["ada@democracylab.test".to_string()]);
        assert_eq!(
            sent[0].body,
            format!(
                "{PASSWORD_RESET_BODY}https://democracylab.test/index/?section=ChangePassword&userId={}&token=1a2b-cafe",
                contributor.id()
            )
        );
        Ok(())
    }

    #[tokio::test]
    async fn request_password_reset_ignores_unknown_email() -> Result<(), Error> {
        let mailer = RecordingMailer::default();
        let accounts = accounts(mailer.clone());
        accounts
            .request_password_reset("nobody@democracylab.test")
            .await?;
        assert!(mailer.sent.lock().await.is_empty());

        accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;
        accounts.request_password_reset("ada@democracylab.test").await?;
        assert_eq!(mailer.sent.lock().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn confirm_email_is_monotonic() -> Result<(), Error> {
        let accounts = accounts(RecordingMailer::default());
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;
        assert!(!contributor.email_verified);

        assert!(!accounts.confirm_email(contributor.id(), "wrong").await?);
        assert!(!accounts.store().get(contributor.id()).await?.email_verified);

        assert!(accounts.confirm_email(contributor.id(), "1a2b-cafe").await?);
        assert!(accounts.store().get(contributor.id()).await?.email_verified);

        // A later bad token never clears the flag.
        assert!(!accounts.confirm_email(contributor.id(), "wrong").await?);
        assert!(accounts.store().get(contributor.id()).await?.email_verified);
        Ok(())
    }

    #[tokio::test]
    async fn confirm_email_unknown_id_is_not_found() {
        let accounts = accounts(RecordingMailer::default());
        let result = accounts.confirm_email(Uuid::new_v4(), "1a2b-cafe").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn real_tokens_verify_end_to_end() -> Result<(), Error> {
        let mailer = RecordingMailer::default();
        let accounts = Accounts::new(
            config(),
            MemoryIdentityStore::new(),
            HmacTokenGenerator::new(SecretString::from("test-secret")),
            mailer.clone(),
        );
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;
        accounts.send_verification_email(&contributor).await?;

        let body = mailer.sent.lock().await[0].body.clone();
        let token = body.rsplit('/').next().unwrap_or_default().to_string();
        assert!(accounts.confirm_email(contributor.id(), &token).await?);
        Ok(())
    }

    #[tokio::test]
    async fn admin_check_uses_configured_email() -> Result<(), Error> {
        let accounts = accounts(RecordingMailer::default());
        let admin = accounts
            .store()
            .insert(new_contributor("admin@democracylab.test"))
            .await?;
        let other = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;
        assert!(accounts.is_admin_contributor(&admin));
        assert!(!accounts.is_admin_contributor(&other));
        Ok(())
    }

    /// In-memory sink for a fmt layer.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut bytes) = self.0.lock() {
                bytes.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn contents(&self) -> String {
            self.0
                .lock()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default()
        }
    }

    /// Send a reset email under the service's default (ERROR) log filter and
    /// return whatever reached the log.
    async fn reset_email_log(log_reset_links: bool) -> anyhow::Result<String> {
        use tracing_subscriber::layer::SubscriberExt;

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(move || writer.clone()),
            )
            .with(crate::cli::telemetry::env_filter(tracing::Level::ERROR)?);
        let _guard = tracing::subscriber::set_default(subscriber);

        let mailer = RecordingMailer::default();
        let accounts = Accounts::new(
            config().with_log_reset_links(log_reset_links),
            MemoryIdentityStore::new(),
            FixedTokens,
            mailer.clone(),
        );
        let contributor = accounts
            .store()
            .insert(new_contributor("ada@democracylab.test"))
            .await?;
        accounts.send_password_reset_email(&contributor).await?;
        assert_eq!(mailer.sent.lock().await.len(), 1);

        Ok(log.contents())
    }

    #[tokio::test]
    async fn reset_link_logged_at_default_verbosity_when_enabled() -> anyhow::Result<()> {
        let log = reset_email_log(true).await?;
        assert!(log.contains("password reset link"), "{log}");
        assert!(log.contains("section=ChangePassword&userId="), "{log}");
        assert!(log.contains("token=1a2b-cafe"), "{log}");
        Ok(())
    }

    #[tokio::test]
    async fn reset_link_not_logged_when_disabled() -> anyhow::Result<()> {
        let log = reset_email_log(false).await?;
        assert!(!log.contains("ChangePassword"), "{log}");
        assert!(!log.contains("1a2b-cafe"), "{log}");
        Ok(())
    }
}
