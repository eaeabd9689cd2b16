//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{accounts, smtp};
use anyhow::{Context, Result};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let accounts_opts = accounts::Options::parse(matches)?;
    Url::parse(&accounts_opts.protocol_domain).context("invalid CIVIC_PROTOCOL_DOMAIN")?;

    Ok(Action::Server(Args {
        port,
        dsn,
        protocol_domain: accounts_opts.protocol_domain,
        email_from: accounts_opts.email_from,
        admin_email: accounts_opts.admin_email,
        secret_key: accounts_opts.secret_key,
        password_reset_timeout_seconds: accounts_opts.password_reset_timeout_seconds,
        log_reset_links: accounts_opts.log_reset_links,
        smtp: smtp::Options::parse(matches),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_VARS: [&str; 4] = [
        "CIVIC_ADMIN_EMAIL",
        "CIVIC_SMTP_HOST",
        "CIVIC_LOG_RESET_LINKS",
        "CIVIC_PASSWORD_RESET_TIMEOUT_SECONDS",
    ];

    fn matches(extra: &[&str]) -> clap::ArgMatches {
        let mut args = vec![
            "civic-accounts",
            "--dsn",
            "postgres://user@localhost:5432/civic",
            "--email-from",
            "hello@democracylab.test",
            "--secret-key",
            "not-so-secret",
        ];
        args.extend_from_slice(extra);
        crate::cli::commands::new().get_matches_from(args)
    }

    #[test]
    fn builds_server_action() {
        temp_env::with_vars_unset(SERVER_VARS, || {
            let result = handler(&matches(&[
                "--protocol-domain",
                "https://www.democracylab.test/",
                "--admin-email",
                "admin@democracylab.test",
            ]));
            let Ok(Action::Server(args)) = result else {
                panic!("expected a server action");
            };
            assert_eq!(args.port, 8080);
            assert_eq!(args.protocol_domain, "https://www.democracylab.test/");
            assert_eq!(args.admin_email.as_deref(), Some("admin@democracylab.test"));
            assert_eq!(args.password_reset_timeout_seconds, 259_200);
            assert!(!args.log_reset_links);
            assert!(args.smtp.is_none());
        });
    }

    #[test]
    fn smtp_host_enables_smtp() {
        temp_env::with_vars_unset(SERVER_VARS, || {
            let result = handler(&matches(&[
                "--protocol-domain",
                "https://www.democracylab.test",
                "--smtp-host",
                "smtp.democracylab.test",
                "--smtp-username",
                "mailer",
                "--smtp-password",
                "hunter2",
            ]));
            let Ok(Action::Server(args)) = result else {
                panic!("expected a server action");
            };
            let smtp = args.smtp.expect("smtp configured");
            assert_eq!(smtp.host, "smtp.democracylab.test");
            assert_eq!(smtp.port, 587);
            assert_eq!(smtp.username.as_deref(), Some("mailer"));
        });
    }

    #[test]
    fn rejects_invalid_protocol_domain() {
        temp_env::with_vars_unset(SERVER_VARS, || {
            let result = handler(&matches(&["--protocol-domain", "democracylab"]));
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err.to_string().contains("invalid CIVIC_PROTOCOL_DOMAIN"));
            }
        });
    }

    #[test]
    fn rejects_blank_email_from() {
        temp_env::with_vars_unset(SERVER_VARS, || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "civic-accounts",
                "--dsn",
                "postgres://user@localhost:5432/civic",
                "--protocol-domain",
                "https://www.democracylab.test",
                "--email-from",
                " ",
                "--secret-key",
                "not-so-secret",
            ]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err
                    .to_string()
                    .contains("missing required argument: --email-from"));
            }
        });
    }
}
