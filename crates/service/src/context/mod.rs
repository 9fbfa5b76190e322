//! User context: the five user lifecycle operations over a configured
//! repository and user schema.
//!
//! [`UserContext`] provides every operation as a default method forwarding to
//! [`operations`]. An adopting type supplies `config()` and overrides only the
//! methods it needs; the rest keep their reference behavior.

pub mod errors;
pub mod operations;
pub mod repository;
pub mod schema;
pub mod repo;

use async_trait::async_trait;
use configs::Config;
use models::{Clauses, Params};

pub use errors::{ContextError, ContextResult, RepoError};
pub use repository::UserRepository;
pub use schema::{PasswordError, UserOf, UserSchema};

#[async_trait]
pub trait UserContext: Send + Sync {
    type Schema: UserSchema + ?Sized;
    type Repo: UserRepository<UserOf<Self::Schema>> + ?Sized;

    fn config(&self) -> &Config<Self::Repo, Self::Schema>;

    async fn authenticate(&self, params: &Params) -> ContextResult<Option<UserOf<Self::Schema>>, UserOf<Self::Schema>> {
        operations::authenticate(self.config(), params).await
    }

    async fn create(&self, params: &Params) -> ContextResult<UserOf<Self::Schema>, UserOf<Self::Schema>> {
        operations::create(self.config(), params).await
    }

    async fn update(&self, user: UserOf<Self::Schema>, params: &Params) -> ContextResult<UserOf<Self::Schema>, UserOf<Self::Schema>> {
        operations::update(self.config(), user, params).await
    }

    async fn delete(&self, user: UserOf<Self::Schema>) -> ContextResult<UserOf<Self::Schema>, UserOf<Self::Schema>> {
        operations::delete(self.config(), user).await
    }

    async fn get_by(&self, clauses: &Clauses) -> ContextResult<Option<UserOf<Self::Schema>>, UserOf<Self::Schema>> {
        operations::get_by(self.config(), clauses).await
    }
}

/// Context adopting every default operation.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use configs::Config;
/// use service::account::AccountSchema;
/// use service::context::{DefaultUserContext, UserContext, repository::memory::MemoryUserRepository};
/// use serde_json::json;
///
/// let config = Config::builder()
///     .repo(Arc::new(MemoryUserRepository::<models::user::Model>::new().with_unique("email")))
///     .user(Arc::new(AccountSchema::with_cost(1024, 1).unwrap()))
///     .build();
/// let ctx = DefaultUserContext::new(config);
///
/// let params = json!({"email": "user@example.com", "password": "Secret123"});
/// let params = params.as_object().unwrap();
/// let user = tokio_test::block_on(ctx.create(params)).unwrap();
/// let found = tokio_test::block_on(ctx.authenticate(params)).unwrap();
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// ```
pub struct DefaultUserContext<R: ?Sized, S: ?Sized> {
    config: Config<R, S>,
}

impl<R: ?Sized, S: ?Sized> DefaultUserContext<R, S> {
    pub fn new(config: Config<R, S>) -> Self {
        Self { config }
    }
}

impl<R, S> UserContext for DefaultUserContext<R, S>
where
    R: UserRepository<UserOf<S>> + ?Sized,
    S: UserSchema + ?Sized,
{
    type Schema = S;
    type Repo = R;

    fn config(&self) -> &Config<R, S> {
        &self.config
    }
}

/// Account users backed by whichever repository the settings select.
pub type AccountContext = DefaultUserContext<dyn UserRepository<models::user::Model>, crate::account::AccountSchema>;
