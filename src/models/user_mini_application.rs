use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User-to-application grant. `access_level` is the granted tier
/// (read, write, or admin).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_mini_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub mini_application_id: i64,
    pub access_level: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::mini_application::Entity",
        from = "Column::MiniApplicationId",
        to = "super::mini_application::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MiniApplication,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::mini_application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MiniApplication.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
