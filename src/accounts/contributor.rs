use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use super::{AccountsConfig, Error};

pub const POSTAL_CODE_MAX_CHARS: usize = 100;
pub const PHONE_PRIMARY_MAX_CHARS: usize = 200;
pub const ABOUT_ME_MAX_CHARS: usize = 100_000;

/// Base identity record owned by the identity store.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub display_name: String,
    pub last_login: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("display_name", &self.display_name)
            .field("last_login", &self.last_login)
            .finish()
    }
}

/// Platform profile attached one-to-one to an [`Identity`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub identity: Identity,
    pub email_verified: bool,
    pub postal_code: String,
    pub phone_primary: Option<String>,
    pub about_me: Option<String>,
}

impl Contributor {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.identity.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.identity.email
    }

    /// Exact, case-sensitive match against the configured administrator email.
    #[must_use]
    pub fn is_admin_contributor(&self, config: &AccountsConfig) -> bool {
        config
            .admin_email()
            .is_some_and(|admin_email| admin_email == self.identity.email)
    }
}

/// Registration input. Stores create the identity and the profile together.
#[derive(Clone, Debug)]
pub struct NewContributor {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub postal_code: String,
    pub phone_primary: Option<String>,
    pub about_me: Option<String>,
}

impl NewContributor {
    /// Check field bounds before anything is written.
    ///
    /// # Errors
    /// Returns `Error::InvalidProfile` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if !valid_email(&self.email) {
            return Err(Error::InvalidProfile("email".to_string()));
        }
        if self.postal_code.trim().is_empty()
            || self.postal_code.chars().count() > POSTAL_CODE_MAX_CHARS
        {
            return Err(Error::InvalidProfile("postal_code".to_string()));
        }
        if exceeds(self.phone_primary.as_deref(), PHONE_PRIMARY_MAX_CHARS) {
            return Err(Error::InvalidProfile("phone_primary".to_string()));
        }
        if exceeds(self.about_me.as_deref(), ABOUT_ME_MAX_CHARS) {
            return Err(Error::InvalidProfile("about_me".to_string()));
        }
        Ok(())
    }

    /// Build the stored record for a freshly registered contributor.
    #[must_use]
    pub fn into_contributor(self, id: Uuid) -> Contributor {
        Contributor {
            identity: Identity {
                id,
                email: self.email,
                password_hash: self.password_hash,
                display_name: self.display_name,
                last_login: None,
            },
            email_verified: false,
            postal_code: self.postal_code,
            phone_primary: self.phone_primary.filter(|phone| !phone.is_empty()),
            about_me: self.about_me.filter(|about| !about.is_empty()),
        }
    }
}

/// Basic email format check.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

fn exceeds(value: Option<&str>, max_chars: usize) -> bool {
    value.is_some_and(|value| value.chars().count() > max_chars)
}
