use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_users::Users;
use super::m20250101_000005_create_mini_applications::MiniApplications;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserMiniApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserMiniApplications::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserMiniApplications::MiniApplicationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserMiniApplications::AccessLevel)
                            .string()
                            .not_null()
                            .default("read"),
                    )
                    .col(
                        ColumnDef::new(UserMiniApplications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserMiniApplications::UserId)
                            .col(UserMiniApplications::MiniApplicationId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_mini_applications_user_id")
                            .from(UserMiniApplications::Table, UserMiniApplications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_mini_applications_mini_application_id")
                            .from(
                                UserMiniApplications::Table,
                                UserMiniApplications::MiniApplicationId,
                            )
                            .to(MiniApplications::Table, MiniApplications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserMiniApplications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UserMiniApplications {
    Table,
    UserId,
    MiniApplicationId,
    AccessLevel,
    CreatedAt,
}
