//! State-bound verification tokens.
//!
//! A token is `{timestamp_base36}-{hex_hmac}`. The HMAC covers the identity's id,
//! password hash, last login, email and the issue timestamp, so any change to those
//! fields invalidates outstanding tokens. Nothing is stored server-side.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::accounts::{Error, Identity};

const KEY_SALT: &str = "civic_accounts.token.HmacTokenGenerator";
const DEFAULT_TIMEOUT_SECONDS: u64 = 3 * 24 * 60 * 60;
// 13 base36 digits cover u64::MAX; anything longer is garbage.
const MAX_TIMESTAMP_DIGITS: usize = 13;

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks tokens bound to an identity's current state.
pub trait TokenService: Send + Sync {
    /// # Errors
    /// Returns an error if the token key cannot be derived.
    fn make_token(&self, identity: &Identity) -> Result<String, Error>;

    fn check_token(&self, identity: &Identity, token: &str) -> bool;
}

#[derive(Clone, Debug)]
pub struct HmacTokenGenerator {
    secret: SecretString,
    timeout: Duration,
}

impl HmacTokenGenerator {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// # Errors
    /// Returns an error if the token key cannot be derived.
    pub fn make_token_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, Error> {
        let timestamp = unix_seconds(now);
        let mac = self.state_mac(identity, timestamp)?;
        Ok(format!(
            "{}-{}",
            to_base36(timestamp),
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    #[must_use]
    pub fn check_token_at(&self, identity: &Identity, token: &str, now: DateTime<Utc>) -> bool {
        let Some((timestamp, signature)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = from_base36(timestamp) else {
            return false;
        };
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        let Ok(mac) = self.state_mac(identity, timestamp) else {
            return false;
        };
        if mac.verify_slice(&signature).is_err() {
            return false;
        }

        unix_seconds(now).saturating_sub(timestamp) <= self.timeout.as_secs()
    }

    fn state_mac(&self, identity: &Identity, timestamp: u64) -> Result<HmacSha256, Error> {
        let key = Sha256::new()
            .chain_update(KEY_SALT.as_bytes())
            .chain_update(self.secret.expose_secret().as_bytes())
            .finalize();
        let mut mac = HmacSha256::new_from_slice(&key)?;

        let last_login = identity
            .last_login
            .map(|at| at.timestamp().to_string())
            .unwrap_or_default();
        let timestamp = timestamp.to_string();
        let id = identity.id.to_string();
        for part in [
            id.as_str(),
            identity.password_hash.as_str(),
            last_login.as_str(),
            timestamp.as_str(),
            identity.email.as_str(),
        ] {
            mac.update(part.as_bytes());
            mac.update(&[0x1f]);
        }
        Ok(mac)
    }
}

impl TokenService for HmacTokenGenerator {
    fn make_token(&self, identity: &Identity) -> Result<String, Error> {
        self.make_token_at(identity, Utc::now())
    }

    fn check_token(&self, identity: &Identity, token: &str) -> bool {
        self.check_token_at(identity, token, Utc::now())
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

fn to_base36(mut value: u64) -> String {
    let mut digits = Vec::new();
    loop {
        let digit = u32::try_from(value % 36).unwrap_or(0);
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        value /= 36;
        if value == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

fn from_base36(value: &str) -> Option<u64> {
    if value.is_empty() || value.len() > MAX_TIMESTAMP_DIGITS {
        return None;
    }
    u64::from_str_radix(value, 36).ok()
}
