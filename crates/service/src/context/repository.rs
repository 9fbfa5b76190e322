use async_trait::async_trait;
use models::{Changeset, Clauses, Record};

use super::errors::RepoError;

/// Persistence layer consumed by the user context.
///
/// Invalid changesets are rejected without touching storage; constraint
/// violations come back as `RepoError::Invalid` with the offending field
/// marked on the changeset.
#[async_trait]
pub trait UserRepository<U: Record>: Send + Sync {
    async fn insert(&self, changeset: Changeset<U>) -> Result<U, RepoError<U>>;
    async fn update(&self, changeset: Changeset<U>) -> Result<U, RepoError<U>>;
    async fn delete(&self, user: U) -> Result<U, RepoError<U>>;
    async fn get_by(&self, clauses: &Clauses) -> Result<Option<U>, RepoError<U>>;
}

pub(crate) const TAKEN: &str = "has already been taken";
pub(crate) const STALE: &str = "is stale";

/// In-memory repository, used by tests, doc examples and the `memory` repo setting.
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;

    use models::Action;
    use tokio::sync::RwLock;
    use tracing::debug;
    use uuid::Uuid;

    pub struct MemoryUserRepository<U> {
        records: RwLock<BTreeMap<Uuid, U>>, // key: primary key
        unique: Vec<String>,
    }

    impl<U: Record> Default for MemoryUserRepository<U> {
        fn default() -> Self {
            Self { records: RwLock::new(BTreeMap::new()), unique: Vec::new() }
        }
    }

    impl<U: Record> MemoryUserRepository<U> {
        pub fn new() -> Self {
            Self::default()
        }

        /// Enforce uniqueness of `field` across records, like a unique index.
        pub fn with_unique(mut self, field: impl Into<String>) -> Self {
            self.unique.push(field.into());
            self
        }

        pub async fn len(&self) -> usize {
            self.records.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.records.read().await.is_empty()
        }

        pub async fn all(&self) -> Vec<U> {
            self.records.read().await.values().cloned().collect()
        }

        /// First unique field whose value collides with another record.
        fn conflict(&self, records: &BTreeMap<Uuid, U>, candidate: &U) -> Option<String> {
            let fields = candidate.fields();
            self.unique.iter().find_map(|field| {
                let value = fields.get(field).filter(|v| !v.is_null())?;
                records
                    .values()
                    .filter(|other| other.primary_key() != candidate.primary_key())
                    .any(|other| other.fields().get(field) == Some(value))
                    .then(|| field.clone())
            })
        }

        fn reject(mut changeset: Changeset<U>, field: &str, message: &str, action: Action) -> RepoError<U> {
            changeset.add_error(field, message);
            RepoError::Invalid(changeset.with_action(action))
        }
    }

    #[async_trait]
    impl<U: Record> UserRepository<U> for MemoryUserRepository<U> {
        async fn insert(&self, changeset: Changeset<U>) -> Result<U, RepoError<U>> {
            if !changeset.is_valid() {
                return Err(RepoError::Invalid(changeset.with_action(Action::Insert)));
            }
            let record = changeset.apply_changes().map_err(|e| RepoError::Backend(e.to_string()))?;
            let mut records = self.records.write().await;
            if records.contains_key(&record.primary_key()) {
                return Err(Self::reject(changeset, "id", TAKEN, Action::Insert));
            }
            if let Some(field) = self.conflict(&records, &record) {
                return Err(Self::reject(changeset, &field, TAKEN, Action::Insert));
            }
            records.insert(record.primary_key(), record.clone());
            debug!(id = %record.primary_key(), "memory_insert");
            Ok(record)
        }

        async fn update(&self, changeset: Changeset<U>) -> Result<U, RepoError<U>> {
            if !changeset.is_valid() {
                return Err(RepoError::Invalid(changeset.with_action(Action::Update)));
            }
            let record = changeset.apply_changes().map_err(|e| RepoError::Backend(e.to_string()))?;
            let mut records = self.records.write().await;
            if !records.contains_key(&record.primary_key()) {
                return Err(Self::reject(changeset, "id", STALE, Action::Update));
            }
            if let Some(field) = self.conflict(&records, &record) {
                return Err(Self::reject(changeset, &field, TAKEN, Action::Update));
            }
            records.insert(record.primary_key(), record.clone());
            Ok(record)
        }

        async fn delete(&self, user: U) -> Result<U, RepoError<U>> {
            let mut records = self.records.write().await;
            match records.remove(&user.primary_key()) {
                Some(removed) => Ok(removed),
                None => Err(Self::reject(Changeset::new(user), "id", STALE, Action::Delete)),
            }
        }

        async fn get_by(&self, clauses: &Clauses) -> Result<Option<U>, RepoError<U>> {
            let records = self.records.read().await;
            let mut found: Vec<&U> = records.values().filter(|r| clauses.matches(&r.fields())).collect();
            match found.len() {
                0 => Ok(None),
                1 => Ok(found.pop().cloned()),
                n => Err(RepoError::MultipleResults(n)),
            }
        }
    }

}
