use models::{Changeset, LoginField, Params, Record};
use thiserror::Error;

/// Failures while hashing or checking a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("hashing error: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
}

/// The user schema collaborator: declares the login field, builds
/// changesets and checks passwords for one record type.
pub trait UserSchema: Send + Sync {
    type User: Record;

    /// Field matched against the login identifier. Must return the same
    /// value on every call.
    fn login_field(&self) -> LoginField;

    /// Canonical form of a login value before lookup.
    fn normalize_login_value(&self, value: &str) -> String {
        value.to_string()
    }

    /// Unsaved record that `create` applies its changeset to.
    fn blank(&self) -> Self::User;

    fn changeset(&self, user: Self::User, params: &Params) -> Changeset<Self::User>;

    fn verify_password(&self, user: &Self::User, password: Option<&str>) -> Result<bool, PasswordError>;
}

pub type UserOf<S> = <S as UserSchema>::User;
