use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub mod resolver;

pub use resolver::{Config, ConfigBuilder, ConfigError};

/// Settings file layout (`config.toml`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Symbolic names for the user context collaborators.
///
/// Both keys are optional in the file; a missing one surfaces as a
/// [`ConfigError`] when the context is first used, not when the file is read.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ContextSettings {
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

pub const REPO_MEMORY: &str = "memory";
pub const REPO_POSTGRES: &str = "postgres";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.context.normalize();
        // DATABASE_URL fills an empty url
        self.database.normalize_from_env();
        if self.context.repo.as_deref() == Some(REPO_POSTGRES) {
            self.database.validate()?;
        }
        Ok(())
    }
}

impl ContextSettings {
    /// Trims names and drops blank ones so they count as missing.
    fn normalize(&mut self) {
        for slot in [&mut self.repo, &mut self.user] {
            *slot = slot
                .take()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty());
        }
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_context_section() {
        let mut cfg = load_from_str(
            r#"
            [context]
            repo = " Memory "
            user = "account"

            [context.options]
            password_min_length = "10"
            "#,
        )
        .unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.context.repo.as_deref(), Some("memory"));
        assert_eq!(cfg.context.user.as_deref(), Some("account"));
        assert_eq!(cfg.context.options.get("password_min_length").map(String::as_str), Some("10"));
    }

    #[test]
    fn blank_names_count_as_missing() {
        let mut cfg = load_from_str("[context]\nrepo = \"  \"\n").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert!(cfg.context.repo.is_none());
        assert!(cfg.context.user.is_none());
    }

    #[test]
    fn postgres_repo_requires_valid_url() {
        let mut cfg = load_from_str(
            "[context]\nrepo = \"postgres\"\nuser = \"account\"\n[database]\nurl = \"mysql://x\"\n",
        )
        .unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn database_defaults_apply() {
        let cfg = load_from_str("[database]\nurl = \"postgres://u@h/db\"\n").unwrap();
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.min_connections, 2);
        assert!(cfg.database.validate().is_ok());
    }

    #[test]
    fn missing_database_section_uses_pool_defaults() {
        let cfg = load_from_str("[context]\nrepo = \"memory\"\n").unwrap();
        assert_eq!(cfg.database.acquire_timeout_secs, 30);
        assert_eq!(cfg.database.idle_timeout_secs, 600);
    }
}
