use crate::{
    accounts::{AccountsConfig, RESET_LINK_TARGET},
    api,
    cli::telemetry,
    mail::{LogMailer, Mailer, SmtpConfig, SmtpMailer},
    token::HmacTokenGenerator,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub protocol_domain: String,
    pub email_from: String,
    pub admin_email: Option<String>,
    pub secret_key: SecretString,
    pub password_reset_timeout_seconds: u64,
    pub log_reset_links: bool,
    pub smtp: Option<SmtpConfig>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the mail transport cannot be configured or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut config = AccountsConfig::new(args.protocol_domain, args.email_from)
        .with_log_reset_links(args.log_reset_links);
    if let Some(admin_email) = args.admin_email {
        config = config.with_admin_email(admin_email);
    }

    if config.log_reset_links() {
        warn!(
            target: RESET_LINK_TARGET,
            "Password reset links will be written to the log"
        );
    }

    let tokens = HmacTokenGenerator::new(args.secret_key)
        .with_timeout(Duration::from_secs(args.password_reset_timeout_seconds));

    let mailer = match &args.smtp {
        Some(smtp) => Mailer::Smtp(
            SmtpMailer::new(smtp).with_context(|| format!("Invalid SMTP host: {}", smtp.host))?,
        ),
        None => {
            warn!("No SMTP host configured, outgoing email will only be logged");
            Mailer::Log(LogMailer)
        }
    };

    debug!("Accounts config: {:?}", config);

    let result = api::new(args.port, args.dsn, config, tokens, mailer).await;

    telemetry::shutdown_tracer();

    result
}
