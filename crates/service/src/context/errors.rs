use std::fmt::Debug;

use configs::ConfigError;
use models::Changeset;
use thiserror::Error;

/// Errors surfaced by the user context operations.
///
/// `authenticate` and `get_by` never return `Invalid`: a missing user and a
/// rejected password are both `Ok(None)`.
#[derive(Debug, Error)]
pub enum ContextError<U: Debug> {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid changeset: {}", .0.error_summary())]
    Invalid(Changeset<U>),
    #[error("repository error: {0}")]
    Repository(String),
}

impl<U: Debug> ContextError<U> {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ContextError::Config(_) => 1000,
            ContextError::Invalid(_) => 1001,
            ContextError::Repository(_) => 1200,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ContextError::Config(_))
    }

    pub fn changeset(&self) -> Option<&Changeset<U>> {
        match self {
            ContextError::Invalid(changeset) => Some(changeset),
            _ => None,
        }
    }

    pub fn into_changeset(self) -> Option<Changeset<U>> {
        match self {
            ContextError::Invalid(changeset) => Some(changeset),
            _ => None,
        }
    }
}

/// Errors reported by a [`UserRepository`](super::repository::UserRepository).
#[derive(Debug, Error)]
pub enum RepoError<U: Debug> {
    #[error("changeset rejected: {}", .0.error_summary())]
    Invalid(Changeset<U>),
    #[error("expected at most one result, got {0}")]
    MultipleResults(usize),
    #[error("repository backend error: {0}")]
    Backend(String),
}

impl<U: Debug> From<RepoError<U>> for ContextError<U> {
    fn from(err: RepoError<U>) -> Self {
        match err {
            RepoError::Invalid(changeset) => ContextError::Invalid(changeset),
            other => ContextError::Repository(other.to_string()),
        }
    }
}

pub type ContextResult<T, U> = Result<T, ContextError<U>>;
