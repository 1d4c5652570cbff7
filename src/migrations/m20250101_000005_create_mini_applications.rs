use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MiniApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MiniApplications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MiniApplications::Name).string().not_null())
                    .col(ColumnDef::new(MiniApplications::Description).string())
                    .col(
                        ColumnDef::new(MiniApplications::Category)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MiniApplications::Icon).string().not_null())
                    .col(ColumnDef::new(MiniApplications::Url).string())
                    .col(
                        ColumnDef::new(MiniApplications::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(MiniApplications::ActiveUsers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MiniApplications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MiniApplications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MiniApplications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum MiniApplications {
    Table,
    Id,
    Name,
    Description,
    Category,
    Icon,
    Url,
    Status,
    ActiveUsers,
    CreatedAt,
    UpdatedAt,
}
