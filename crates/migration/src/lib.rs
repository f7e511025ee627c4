//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_profile;
mod m20240101_000002_create_user_credentials;
mod m20240101_000003_create_sweet;
mod m20240101_000004_create_purchase;
mod m20240101_000005_create_auth_token;
mod m20240101_000006_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_profile::Migration),
            Box::new(m20240101_000002_create_user_credentials::Migration),
            Box::new(m20240101_000003_create_sweet::Migration),
            Box::new(m20240101_000004_create_purchase::Migration),
            Box::new(m20240101_000005_create_auth_token::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000006_add_indexes::Migration),
        ]
    }
}
