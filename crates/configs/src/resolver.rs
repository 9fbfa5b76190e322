//! Resolution of the user context collaborators.
//!
//! A [`Config`] is built once at startup and then only read. The `repo` and
//! `user` slots are resolved on every call so that an incomplete config fails
//! with a [`ConfigError`] before any persistence access happens.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub const REPO_KEY: &str = "repo";
pub const USER_KEY: &str = "user";

/// Configuration errors. These are programming or deployment mistakes, never
/// per-request conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no `repo` configured: the user context needs a persistence target")]
    MissingRepo,
    #[error("no `user` configured: the user context needs a user schema")]
    MissingUser,
    #[error("required option `{0}` is not set")]
    MissingOption(String),
    #[error("unsupported value `{value}` for `{key}`")]
    Unsupported { key: String, value: String },
}

impl ConfigError {
    /// Name of the config key the error is about.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::MissingRepo => REPO_KEY,
            ConfigError::MissingUser => USER_KEY,
            ConfigError::MissingOption(key) => key,
            ConfigError::Unsupported { key, .. } => key,
        }
    }
}

/// Immutable context configuration: a persistence target `R`, a user schema
/// `S` and free-form string options.
pub struct Config<R: ?Sized, S: ?Sized> {
    repo: Option<Arc<R>>,
    user: Option<Arc<S>>,
    options: BTreeMap<String, String>,
}

impl<R: ?Sized, S: ?Sized> Config<R, S> {
    pub fn builder() -> ConfigBuilder<R, S> {
        ConfigBuilder::default()
    }

    /// Resolves the persistence target.
    pub fn repo(&self) -> Result<&Arc<R>, ConfigError> {
        self.repo.as_ref().ok_or(ConfigError::MissingRepo)
    }

    /// Resolves the user schema.
    pub fn user(&self) -> Result<&Arc<S>, ConfigError> {
        self.user.as_ref().ok_or(ConfigError::MissingUser)
    }

    /// Returns the option stored under `key`, or `default` when absent.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Returns the option stored under `key` or fails.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.options
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingOption(key.to_string()))
    }

    /// Checks both required collaborators at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.repo()?;
        self.user()?;
        Ok(())
    }
}

impl<R: ?Sized, S: ?Sized> Clone for Config<R, S> {
    fn clone(&self) -> Self {
        Self { repo: self.repo.clone(), user: self.user.clone(), options: self.options.clone() }
    }
}

impl<R: ?Sized, S: ?Sized> fmt::Debug for Config<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repo", &self.repo.is_some())
            .field("user", &self.user.is_some())
            .field("options", &self.options)
            .finish()
    }
}

pub struct ConfigBuilder<R: ?Sized, S: ?Sized> {
    repo: Option<Arc<R>>,
    user: Option<Arc<S>>,
    options: BTreeMap<String, String>,
}

impl<R: ?Sized, S: ?Sized> Default for ConfigBuilder<R, S> {
    fn default() -> Self {
        Self { repo: None, user: None, options: BTreeMap::new() }
    }
}

impl<R: ?Sized, S: ?Sized> ConfigBuilder<R, S> {
    pub fn repo(mut self, repo: Arc<R>) -> Self {
        self.repo = Some(repo);
        self
    }

    pub fn user(mut self, user: Arc<S>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.extend(options.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> Config<R, S> {
        Config { repo: self.repo, user: self.user, options: self.options }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repo;
    struct Schema;

    #[test]
    fn missing_repo_is_reported_first() {
        let cfg: Config<Repo, Schema> = Config::builder().build();
        assert_eq!(cfg.validate(), Err(ConfigError::MissingRepo));
        assert_eq!(cfg.repo().err().map(|e| e.key().to_string()), Some("repo".into()));
    }

    #[test]
    fn missing_user_names_the_schema_role() {
        let cfg: Config<Repo, Schema> = Config::builder().repo(Arc::new(Repo)).build();
        let err = cfg.user().err().unwrap();
        assert_eq!(err, ConfigError::MissingUser);
        assert!(err.to_string().contains("user schema"));
    }

    #[test]
    fn complete_config_resolves() {
        let cfg: Config<Repo, Schema> = Config::builder()
            .repo(Arc::new(Repo))
            .user(Arc::new(Schema))
            .build();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn get_falls_back_to_default() {
        let cfg: Config<Repo, Schema> = Config::builder().option("realm", "staff").build();
        assert_eq!(cfg.get("realm", "public"), "staff");
        assert_eq!(cfg.get("locale", "en"), "en");
        assert_eq!(cfg.require("locale"), Err(ConfigError::MissingOption("locale".into())));
    }
}
