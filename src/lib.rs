//! Pluggable user context.
//!
//! Re-exports the pieces an application needs to configure a context and run
//! the user lifecycle operations: `authenticate`, `create`, `update`,
//! `delete` and `get_by`.

pub use configs::{AppConfig, Config, ConfigBuilder, ConfigError};
pub use models::{Action, Changeset, Clauses, LoginField, Params, Record};
pub use service::account::AccountSchema;
pub use service::context::repository::memory::MemoryUserRepository;
pub use service::context::repo::seaorm::SeaOrmUserRepository;
pub use service::context::{
    operations, AccountContext, ContextError, ContextResult, DefaultUserContext, PasswordError, RepoError, UserContext,
    UserOf, UserRepository, UserSchema,
};
pub use service::setup::build_account_context;
