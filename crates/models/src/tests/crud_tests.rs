use crate::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use anyhow::Result;
use uuid::Uuid;

use super::setup_test_db;

/// Test user CRUD operations
#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let mut blank = user::Model::blank();
    blank.email = format!("test_{}@example.com", Uuid::new_v4());
    blank.name = "Test User".to_string();
    blank.password_hash = "not-a-real-hash".to_string();

    // Create
    let am: user::ActiveModel = blank.clone().into();
    let created = am.reset_all().insert(&db).await?;
    assert_eq!(created.id, blank.id);
    assert_eq!(created.email, blank.email);

    // Read by email
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(blank.email.clone()))
        .one(&db)
        .await?;
    assert_eq!(found.map(|u| u.id), Some(created.id));

    // Update
    let mut am: user::ActiveModel = created.clone().into();
    am.name = sea_orm::Set("Renamed".to_string());
    let updated = am.update(&db).await?;
    assert_eq!(updated.name, "Renamed");

    // Delete
    user::Entity::delete_by_id(created.id).exec(&db).await?;
    let gone = user::Entity::find_by_id(created.id).one(&db).await?;
    assert!(gone.is_none());

    println!("User CRUD test completed successfully");
    Ok(())
}

/// The unique index on `email` rejects a second row with the same address.
#[tokio::test]
async fn test_user_email_unique() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = format!("dup_{}@example.com", Uuid::new_v4());
    let mut first = user::Model::blank();
    first.email = email.clone();
    let first: user::ActiveModel = first.into();
    let first = first.reset_all().insert(&db).await?;

    let mut second = user::Model::blank();
    second.email = email;
    let second: user::ActiveModel = second.into();
    let err = second.reset_all().insert(&db).await;
    assert!(err.is_err());

    user::Entity::delete_by_id(first.id).exec(&db).await?;
    Ok(())
}
