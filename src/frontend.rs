//! Links into the front-end single-page app.

use url::Url;
use uuid::Uuid;

/// Front-end sections reachable through `/index/?section=...`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontEndSection {
    ChangePassword,
    EmailVerified,
}

impl FrontEndSection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChangePassword => "ChangePassword",
            Self::EmailVerified => "EmailVerified",
        }
    }
}

/// Build `{protocol_domain}/index/?section={section}&{params...}`.
///
/// # Errors
/// Returns an error if `protocol_domain` is not an absolute URL.
pub fn section_url(
    protocol_domain: &str,
    section: FrontEndSection,
    params: &[(&str, &str)],
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/index/", protocol_domain.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("section", section.as_str())
        .extend_pairs(params);
    Ok(url)
}

/// Email verification link served by `GET /verify_user/{id}/{token}`.
#[must_use]
pub fn verification_url(protocol_domain: &str, id: Uuid, token: &str) -> String {
    format!("{protocol_domain}/verify_user/{id}/{token}")
}
