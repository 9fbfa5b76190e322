//! Reference implementations of the five user context operations.
//!
//! Every operation resolves both collaborators from the config before it
//! touches the repository. The operations call each other directly, never
//! through a [`UserContext`](super::UserContext), so an adopter overriding
//! one method does not change what the others do.

use std::sync::Arc;

use configs::{Config, ConfigError};
use models::{params::param_str, Clauses, Params, Record};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::errors::ContextResult;
use super::repository::UserRepository;
use super::schema::{UserOf, UserSchema};

/// Resolves `(repo, user)` or fails with the first missing role.
pub fn collaborators<R, S>(config: &Config<R, S>) -> Result<(&Arc<R>, &Arc<S>), ConfigError>
where
    R: ?Sized,
    S: ?Sized,
{
    Ok((config.repo()?, config.user()?))
}

/// Looks the user up by the schema's login field and checks the password.
///
/// A missing user, a wrong password and a verification error all give
/// `Ok(None)`, so callers cannot tell which condition failed.
#[instrument(skip_all)]
pub async fn authenticate<R, S>(config: &Config<R, S>, params: &Params) -> ContextResult<Option<UserOf<S>>, UserOf<S>>
where
    R: UserRepository<UserOf<S>> + ?Sized,
    S: UserSchema + ?Sized,
{
    let (_, schema) = collaborators(config)?;
    let login_field = schema.login_field();
    let login_value = match params.get(login_field.as_str()) {
        Some(Value::String(value)) => Value::String(schema.normalize_login_value(value)),
        Some(other) => other.clone(),
        None => Value::Null,
    };
    let password = param_str(params, "password");

    let clauses = Clauses::new().with(login_field.as_str(), login_value);
    let Some(user) = get_by(config, &clauses).await? else {
        debug!(%login_field, "authentication_failed");
        return Ok(None);
    };

    match schema.verify_password(&user, password) {
        Ok(true) => {
            debug!(user_id = %user.primary_key(), "authenticated");
            Ok(Some(user))
        }
        Ok(false) => {
            debug!(%login_field, "authentication_failed");
            Ok(None)
        }
        Err(e) => {
            warn!(user_id = %user.primary_key(), error = %e, "password_verification_error");
            Ok(None)
        }
    }
}

/// Builds a changeset on a blank record and inserts it.
#[instrument(skip_all)]
pub async fn create<R, S>(config: &Config<R, S>, params: &Params) -> ContextResult<UserOf<S>, UserOf<S>>
where
    R: UserRepository<UserOf<S>> + ?Sized,
    S: UserSchema + ?Sized,
{
    let (repo, schema) = collaborators(config)?;
    let changeset = schema.changeset(schema.blank(), params);
    let user = repo.insert(changeset).await?;
    info!(user_id = %user.primary_key(), "user_created");
    Ok(user)
}

/// Builds a changeset against the loaded `user` and updates it.
#[instrument(skip_all, fields(user_id = %user.primary_key()))]
pub async fn update<R, S>(config: &Config<R, S>, user: UserOf<S>, params: &Params) -> ContextResult<UserOf<S>, UserOf<S>>
where
    R: UserRepository<UserOf<S>> + ?Sized,
    S: UserSchema + ?Sized,
{
    let (repo, schema) = collaborators(config)?;
    let changeset = schema.changeset(user, params);
    let user = repo.update(changeset).await?;
    info!("user_updated");
    Ok(user)
}

#[instrument(skip_all, fields(user_id = %user.primary_key()))]
pub async fn delete<R, S>(config: &Config<R, S>, user: UserOf<S>) -> ContextResult<UserOf<S>, UserOf<S>>
where
    R: UserRepository<UserOf<S>> + ?Sized,
    S: UserSchema + ?Sized,
{
    let (repo, _) = collaborators(config)?;
    let user = repo.delete(user).await?;
    info!("user_deleted");
    Ok(user)
}

/// Single user matching every clause, or `None`.
pub async fn get_by<R, S>(config: &Config<R, S>, clauses: &Clauses) -> ContextResult<Option<UserOf<S>>, UserOf<S>>
where
    R: UserRepository<UserOf<S>> + ?Sized,
    S: UserSchema + ?Sized,
{
    let (repo, _) = collaborators(config)?;
    Ok(repo.get_by(clauses).await?)
}
