use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::Utc;

use crate::record::Record;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unsaved user with a fresh id and no credentials.
    pub fn blank() -> Self {
        let now = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            email: String::new(),
            name: String::new(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Model {
    fn primary_key(&self) -> Uuid {
        self.id
    }
}
