use std::str::FromStr;

use chrono::DateTime;
use models::{user, Action, Changeset, Clauses};
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
    SqlErr,
};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::errors::RepoError;
use crate::context::repository::{UserRepository, STALE, TAKEN};

pub struct SeaOrmUserRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Field named by a unique constraint in a Postgres violation message,
/// e.g. `users_pkey` or `users_email_key`.
fn unique_violation_field(message: &str) -> &'static str {
    let constraint = message.split('"').nth(1).unwrap_or(message);
    if constraint.ends_with("_pkey") {
        return "id";
    }
    // email carries the only other unique index
    "email"
}

/// Maps a write failure onto the changeset when it is a constraint violation.
fn write_error(mut changeset: Changeset<user::Model>, err: DbErr, action: Action) -> RepoError<user::Model> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            changeset.add_error(unique_violation_field(&message), TAKEN);
            return RepoError::Invalid(changeset.with_action(action));
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            changeset.add_error("id", "is still associated with other records");
            return RepoError::Invalid(changeset.with_action(action));
        }
        _ => {}
    }
    if matches!(err, DbErr::RecordNotUpdated) {
        changeset.add_error("id", STALE);
        return RepoError::Invalid(changeset.with_action(action));
    }
    warn!(error = %err, ?action, "user_write_failed");
    RepoError::Backend(err.to_string())
}

/// Builds `col = value` for one clause; `null` becomes `IS NULL`.
///
/// `Ok(None)` means the value can never equal the column, so nothing
/// matches. Only an unknown field is an error.
fn clause_condition(field: &str, value: &Value) -> Result<Option<SimpleExpr>, RepoError<user::Model>> {
    use user::Column;

    let col = Column::from_str(field).map_err(|_| RepoError::Backend(format!("unknown field `{field}`")))?;
    let expr = match (col, value) {
        (_, Value::Null) => Some(col.is_null()),
        (Column::Id, Value::String(s)) => Uuid::parse_str(s).ok().map(|id| col.eq(id)),
        (Column::Email | Column::Name | Column::PasswordHash, Value::String(s)) => Some(col.eq(s.clone())),
        (Column::CreatedAt | Column::UpdatedAt, Value::String(s)) => {
            DateTime::parse_from_rfc3339(s).ok().map(|at| col.eq(at))
        }
        _ => None,
    };
    Ok(expr)
}

#[async_trait::async_trait]
impl UserRepository<user::Model> for SeaOrmUserRepository {
    async fn insert(&self, changeset: Changeset<user::Model>) -> Result<user::Model, RepoError<user::Model>> {
        if !changeset.is_valid() {
            return Err(RepoError::Invalid(changeset.with_action(Action::Insert)));
        }
        let record = changeset.apply_changes().map_err(|e| RepoError::Backend(e.to_string()))?;
        let am: user::ActiveModel = record.into();
        am.reset_all()
            .insert(&self.db)
            .await
            .map_err(|e| write_error(changeset, e, Action::Insert))
    }

    async fn update(&self, changeset: Changeset<user::Model>) -> Result<user::Model, RepoError<user::Model>> {
        if !changeset.is_valid() {
            return Err(RepoError::Invalid(changeset.with_action(Action::Update)));
        }
        let record = changeset.apply_changes().map_err(|e| RepoError::Backend(e.to_string()))?;
        let am: user::ActiveModel = record.into();
        am.reset_all()
            .update(&self.db)
            .await
            .map_err(|e| write_error(changeset, e, Action::Update))
    }

    async fn delete(&self, user: user::Model) -> Result<user::Model, RepoError<user::Model>> {
        match user::Entity::delete_by_id(user.id).exec(&self.db).await {
            Ok(res) if res.rows_affected == 0 => Err(write_error(Changeset::new(user), DbErr::RecordNotUpdated, Action::Delete)),
            Ok(_) => Ok(user),
            Err(e) => Err(write_error(Changeset::new(user), e, Action::Delete)),
        }
    }

    async fn get_by(&self, clauses: &Clauses) -> Result<Option<user::Model>, RepoError<user::Model>> {
        let mut cond = Condition::all();
        for (field, value) in clauses.iter() {
            let Some(expr) = clause_condition(field, value)? else {
                debug!(field, "user_lookup_unmatchable_value");
                return Ok(None);
            };
            cond = cond.add(expr);
        }
        let mut found = user::Entity::find()
            .filter(cond)
            .limit(2)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Backend(e.to_string()))?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            n => Err(RepoError::MultipleResults(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountSchema;
    use crate::context::{DefaultUserContext, UserContext};
    use crate::test_support::get_db;
    use configs::Config;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn only_unknown_columns_are_rejected() {
        assert!(clause_condition("nickname", &json!("x")).is_err());
        assert!(clause_condition("email", &json!("a@b.com")).unwrap().is_some());
        assert!(clause_condition("email", &Value::Null).unwrap().is_some());
        assert!(clause_condition("created_at", &json!("2024-01-01T00:00:00+00:00")).unwrap().is_some());
    }

    #[test]
    fn unmatchable_values_give_no_condition() {
        assert!(clause_condition("id", &json!("not-a-uuid")).unwrap().is_none());
        assert!(clause_condition("id", &json!(7)).unwrap().is_none());
        assert!(clause_condition("email", &json!(42)).unwrap().is_none());
        assert!(clause_condition("name", &json!(["a"])).unwrap().is_none());
        assert!(clause_condition("updated_at", &json!("yesterday")).unwrap().is_none());
    }

    #[test]
    fn unique_violation_names_the_constrained_field() {
        let pkey = r#"duplicate key value violates unique constraint "users_pkey""#;
        let email = r#"duplicate key value violates unique constraint "users_email_key""#;
        assert_eq!(unique_violation_field(pkey), "id");
        assert_eq!(unique_violation_field(email), "email");
    }

    #[tokio::test]
    async fn account_lifecycle_on_postgres() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let config = Config::builder()
            .repo(Arc::new(SeaOrmUserRepository::new(db)))
            .user(Arc::new(AccountSchema::with_cost(1024, 1)?))
            .build();
        let ctx = DefaultUserContext::new(config);

        let email = format!("svc_{}@example.com", Uuid::new_v4());
        let params = json!({"email": email, "password": "Secret123", "name": "Svc User"});
        let params = params.as_object().cloned().unwrap();
        let user = ctx.create(&params).await?;
        assert_eq!(user.email, email);

        let dup = ctx.create(&params).await.unwrap_err();
        assert_eq!(dup.changeset().map(|cs| cs.errors_on("email").to_vec()), Some(vec![TAKEN.to_string()]));

        let found = ctx.authenticate(&params).await?;
        assert_eq!(found.as_ref().map(|u| u.id), Some(user.id));
        let odd = json!({"email": 42, "password": "Secret123"});
        assert!(ctx.authenticate(odd.as_object().unwrap()).await?.is_none());
        assert!(ctx.get_by(&Clauses::new().with("id", "not-a-uuid")).await?.is_none());

        let long = json!({"email": format!("{}@example.com", "x".repeat(250)), "password": "Secret123"});
        let err = ctx.create(long.as_object().unwrap()).await.unwrap_err();
        assert!(err.changeset().is_some_and(|cs| !cs.errors_on("email").is_empty()));

        let updated = ctx.update(user.clone(), json!({"name": "Renamed"}).as_object().unwrap()).await?;
        assert_eq!(updated.name, "Renamed");
        let reloaded = ctx.get_by(&Clauses::new().with("email", email.as_str())).await?;
        assert_eq!(reloaded.map(|u| u.name), Some("Renamed".to_string()));

        ctx.delete(updated.clone()).await?;
        assert!(ctx.get_by(&Clauses::new().with("email", email.as_str())).await?.is_none());
        let stale = ctx.delete(updated).await.unwrap_err();
        assert!(stale.changeset().is_some());
        Ok(())
    }
}
