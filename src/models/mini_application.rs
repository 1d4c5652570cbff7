use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A cataloged internal tool entry users can be granted access to launch.
///
/// `status` is one of: active, maintenance, inactive, development.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mini_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub icon: String,
    pub url: Option<String>,
    pub status: String,
    pub active_users: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_mini_application::Entity")]
    UserMiniApplications,
}

impl Related<super::user_mini_application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserMiniApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
