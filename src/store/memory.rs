use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::IdentityStore;
use crate::accounts::{Contributor, Error, NewContributor};

/// In-process store for local development and tests.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    records: RwLock<HashMap<Uuid, Contributor>>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a record, as the account-deletion flow would.
    pub async fn remove(&self, id: Uuid) -> Option<Contributor> {
        self.records.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn get(&self, id: Uuid) -> Result<Contributor, Error> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contributor>, Error> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.email() == email)
            .cloned())
    }

    async fn insert(&self, contributor: NewContributor) -> Result<Contributor, Error> {
        contributor.validate()?;

        let mut records = self.records.write().await;
        if records.values().any(|record| record.email() == contributor.email) {
            return Err(Error::AlreadyExists(contributor.email));
        }

        let record = contributor.into_contributor(Uuid::new_v4());
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), Error> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(Error::NotFound(id))?;
        record.email_verified = true;
        Ok(())
    }

    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }
}
