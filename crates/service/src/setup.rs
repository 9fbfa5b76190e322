//! Startup wiring: turns the `[context]` settings into an [`AccountContext`].

use std::sync::Arc;

use configs::resolver::{REPO_KEY, USER_KEY};
use configs::{AppConfig, Config, ConfigBuilder, ConfigError, DatabaseConfig, REPO_MEMORY};
use models::user;
use tracing::info;

use crate::account::AccountSchema;
use crate::context::repository::memory::MemoryUserRepository;
use crate::context::{AccountContext, DefaultUserContext, UserRepository};

/// Name selecting [`AccountSchema`] in `context.user`.
pub const USER_ACCOUNT: &str = "account";

type AccountRepo = dyn UserRepository<user::Model>;

/// Builds the context named by `cfg.context`.
///
/// A missing `repo` or `user` leaves that slot empty, so the context reports
/// a [`ConfigError`] on first use. Unknown names fail here.
pub async fn build_account_context(cfg: &AppConfig) -> anyhow::Result<AccountContext> {
    let settings = &cfg.context;
    let mut builder: ConfigBuilder<AccountRepo, AccountSchema> =
        Config::builder().options(settings.options.clone());

    if let Some(name) = settings.repo.as_deref() {
        builder = builder.repo(build_repo(name, &cfg.database).await?);
    }
    if let Some(name) = settings.user.as_deref() {
        let options: Config<(), ()> = Config::builder().options(settings.options.clone()).build();
        builder = builder.user(Arc::new(build_schema(name, &options)?));
    }

    info!(repo = ?settings.repo, user = ?settings.user, "user_context_built");
    Ok(DefaultUserContext::new(builder.build()))
}

fn build_schema(name: &str, options: &Config<(), ()>) -> anyhow::Result<AccountSchema> {
    match name {
        USER_ACCOUNT => Ok(AccountSchema::from_options(options)?),
        other => Err(ConfigError::Unsupported { key: USER_KEY.into(), value: other.into() }.into()),
    }
}

#[cfg_attr(not(feature = "seaorm"), allow(unused_variables))]
async fn build_repo(name: &str, database: &DatabaseConfig) -> anyhow::Result<Arc<AccountRepo>> {
    let repo: Arc<AccountRepo> = match name {
        REPO_MEMORY => Arc::new(MemoryUserRepository::<user::Model>::new().with_unique("email")),
        #[cfg(feature = "seaorm")]
        configs::REPO_POSTGRES => {
            use migration::MigratorTrait;

            let db = models::db::connect_with_config(database).await?;
            migration::Migrator::up(&db, None).await?;
            Arc::new(crate::context::repo::seaorm::SeaOrmUserRepository::new(db))
        }
        other => return Err(ConfigError::Unsupported { key: REPO_KEY.into(), value: other.into() }.into()),
    };
    Ok(repo)
}
