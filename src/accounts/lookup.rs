use super::{Contributor, Error};
use crate::store::IdentityStore;

/// Exact email lookup. A missing contributor is `Ok(None)`, never an error, so
/// callers can branch on absence (e.g. "is this username taken?").
///
/// # Errors
/// Only store failures.
pub async fn get_contributor_by_username<S: IdentityStore>(
    store: &S,
    username: &str,
) -> Result<Option<Contributor>, Error> {
    store.find_by_email(username).await
}

/// Resolve the authenticated caller, if any, to a contributor.
///
/// # Errors
/// Only store failures.
pub async fn get_request_contributor<S: IdentityStore>(
    store: &S,
    caller: Option<&str>,
) -> Result<Option<Contributor>, Error> {
    match caller {
        Some(username) => get_contributor_by_username(store, username).await,
        None => Ok(None),
    }
}
