//! Outbound email delivery.
//!
//! Notifications are composed by the accounts component and handed to a
//! `MailGateway`. The gateway decides how to deliver (SMTP in production, the log
//! in local dev) and returns `Ok`/`Err`; delivery errors are not retried here.
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use tracing::{debug, info};

use crate::accounts::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

impl EmailMessage {
    /// Plain-text message addressed to a single recipient.
    #[must_use]
    pub fn new(subject: &str, body: String, from: &str, to: &str) -> Self {
        Self {
            subject: subject.to_string(),
            body,
            from: from.to_string(),
            to: vec![to.to_string()],
        }
    }
}

/// Email delivery abstraction used by the notification flows.
pub trait MailGateway: Send + Sync {
    /// Deliver a message or return the transport error.
    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

impl MailGateway for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        info!(
            to = ?message.to,
            from = %message.from,
            subject = %message.subject,
            "email send stub"
        );
        // Bodies carry live tokens; only visible when debugging locally.
        debug!(body = %message.body, "email send stub body");
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: SecretString,
}

/// SMTP delivery over STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    /// Returns an error if the relay cannot be configured for `config.host`.
    pub fn new(config: &SmtpConfig) -> Result<Self, Error> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);

        if let Some(username) = &config.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl MailGateway for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        let email = build_message(message)?;
        self.transport.send(email).await?;

        info!(to = ?message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

fn build_message(message: &EmailMessage) -> Result<Message, Error> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);
    for to in &message.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    Ok(builder.body(message.body.clone())?)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, Error> {
    address
        .parse()
        .map_err(|_| Error::InvalidAddress(address.to_string()))
}

/// Gateway selected at startup: SMTP when a host is configured, the log otherwise.
#[derive(Clone, Debug)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl MailGateway for Mailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        match self {
            Self::Smtp(mailer) => mailer.send(message).await,
            Self::Log(mailer) => mailer.send(message).await,
        }
    }
}
