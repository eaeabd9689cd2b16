use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::mail::SmtpConfig;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";

pub struct Options;

impl Options {
    /// SMTP settings, or `None` when no host is configured.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Option<SmtpConfig> {
        let host = matches
            .get_one::<String>(ARG_SMTP_HOST)
            .filter(|v| !v.trim().is_empty())?;

        Some(SmtpConfig {
            host: host.clone(),
            port: matches.get_one::<u16>(ARG_SMTP_PORT).copied().unwrap_or(587),
            username: matches.get_one::<String>(ARG_SMTP_USERNAME).cloned(),
            password: SecretString::from(
                matches
                    .get_one::<String>(ARG_SMTP_PASSWORD)
                    .cloned()
                    .unwrap_or_default(),
            ),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host; email is only logged when unset")
                .env("CIVIC_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port (STARTTLS)")
                .env("CIVIC_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("CIVIC_SMTP_USERNAME")
                .requires(ARG_SMTP_PASSWORD),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("CIVIC_SMTP_PASSWORD")
                .hide_env_values(true),
        )
}
