use sea_orm_migration::prelude::*;

mod m20250101_000001_create_departments;
mod m20250101_000002_create_users;
mod m20250101_000003_create_roles;
mod m20250101_000004_create_permissions;
mod m20250101_000005_create_mini_applications;
mod m20250101_000006_create_user_roles;
mod m20250101_000007_create_role_permissions;
mod m20250101_000008_create_user_mini_applications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_departments::Migration),
            Box::new(m20250101_000002_create_users::Migration),
            Box::new(m20250101_000003_create_roles::Migration),
            Box::new(m20250101_000004_create_permissions::Migration),
            Box::new(m20250101_000005_create_mini_applications::Migration),
            Box::new(m20250101_000006_create_user_roles::Migration),
            Box::new(m20250101_000007_create_role_permissions::Migration),
            Box::new(m20250101_000008_create_user_mini_applications::Migration),
        ]
    }
}
