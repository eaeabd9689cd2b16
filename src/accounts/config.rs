/// Read-only settings the contributor component consumes.
#[derive(Clone, Debug)]
pub struct AccountsConfig {
    admin_email: Option<String>,
    protocol_domain: String,
    email_from: String,
    log_reset_links: bool,
}

impl AccountsConfig {
    /// `protocol_domain` is the public origin used in outbound links, e.g.
    /// `https://www.democracylab.org`. A trailing slash is dropped.
    #[must_use]
    pub fn new(protocol_domain: String, email_from: String) -> Self {
        Self {
            admin_email: None,
            protocol_domain: protocol_domain.trim_end_matches('/').to_string(),
            email_from,
            log_reset_links: false,
        }
    }

    #[must_use]
    pub fn with_admin_email(mut self, admin_email: String) -> Self {
        self.admin_email = Some(admin_email);
        self
    }

    /// Also write password reset links to the log. Meant for local development.
    #[must_use]
    pub fn with_log_reset_links(mut self, enabled: bool) -> Self {
        self.log_reset_links = enabled;
        self
    }

    #[must_use]
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    #[must_use]
    pub fn protocol_domain(&self) -> &str {
        &self.protocol_domain
    }

    #[must_use]
    pub fn email_from(&self) -> &str {
        &self.email_from
    }

    #[must_use]
    pub fn log_reset_links(&self) -> bool {
        self.log_reset_links
    }
}
