//! Identity store: persistence for identities and their contributor profiles.

use std::future::Future;
use uuid::Uuid;

use crate::accounts::{Contributor, Error, NewContributor};

mod memory;
mod postgres;

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

pub trait IdentityStore: Send + Sync {
    /// Fetch the canonical record, failing with `Error::NotFound` when it is gone.
    fn get(&self, id: Uuid) -> impl Future<Output = Result<Contributor, Error>> + Send;

    /// First record whose email matches exactly, if any.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Contributor>, Error>> + Send;

    /// Create the identity and its profile together. `email_verified` starts false.
    fn insert(
        &self,
        contributor: NewContributor,
    ) -> impl Future<Output = Result<Contributor, Error>> + Send;

    /// Set `email_verified`. There is deliberately no way to clear it.
    fn mark_email_verified(&self, id: Uuid) -> impl Future<Output = Result<(), Error>> + Send;

    /// Liveness check used by `/health`.
    fn ping(&self) -> impl Future<Output = Result<(), Error>> + Send;
}
