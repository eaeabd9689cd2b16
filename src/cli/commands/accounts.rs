use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PROTOCOL_DOMAIN: &str = "protocol-domain";
pub const ARG_EMAIL_FROM: &str = "email-from";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_PASSWORD_RESET_TIMEOUT: &str = "password-reset-timeout-seconds";
pub const ARG_LOG_RESET_LINKS: &str = "log-reset-links";

#[derive(Debug, Clone)]
pub struct Options {
    pub protocol_domain: String,
    pub email_from: String,
    pub admin_email: Option<String>,
    pub secret_key: SecretString,
    pub password_reset_timeout_seconds: u64,
    pub log_reset_links: bool,
}

impl Options {
    /// Parse account arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            protocol_domain: read_required(ARG_PROTOCOL_DOMAIN)?,
            email_from: read_required(ARG_EMAIL_FROM)?,
            admin_email: matches
                .get_one::<String>(ARG_ADMIN_EMAIL)
                .cloned()
                .filter(|v| !v.trim().is_empty()),
            secret_key: SecretString::from(read_required(ARG_SECRET_KEY)?),
            password_reset_timeout_seconds: matches
                .get_one::<u64>(ARG_PASSWORD_RESET_TIMEOUT)
                .copied()
                .unwrap_or(259_200),
            log_reset_links: matches.get_flag(ARG_LOG_RESET_LINKS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROTOCOL_DOMAIN)
                .long(ARG_PROTOCOL_DOMAIN)
                .help("Public base URL used in emailed links, example: https://www.democracylab.org")
                .env("CIVIC_PROTOCOL_DOMAIN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("Sender address for outgoing email")
                .env("CIVIC_EMAIL_FROM")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Email address of the site administrator")
                .env("CIVIC_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Secret used to sign verification and password reset tokens")
                .env("CIVIC_SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD_RESET_TIMEOUT)
                .long(ARG_PASSWORD_RESET_TIMEOUT)
                .help("Seconds a verification or password reset token stays valid")
                .env("CIVIC_PASSWORD_RESET_TIMEOUT_SECONDS")
                .default_value("259200")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOG_RESET_LINKS)
                .long(ARG_LOG_RESET_LINKS)
                .help("Log password reset links (development only)")
                .env("CIVIC_LOG_RESET_LINKS")
                .action(ArgAction::SetTrue),
        )
}
