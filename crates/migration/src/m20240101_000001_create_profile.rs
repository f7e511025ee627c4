//! Create `profile` table.
//!
//! One row per account; `role` is either `user` or `admin`, and
//! `email_confirmed_at` stays NULL until the signup token is redeemed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(uuid(Profile::Id).primary_key())
                    .col(string_len(Profile::Email, 255).unique_key().not_null())
                    .col(string_len(Profile::FullName, 128).not_null())
                    .col(string_len(Profile::Role, 32).not_null())
                    .col(
                        ColumnDef::new(Profile::EmailConfirmedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(Profile::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Profile::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Profile::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Profile { Table, Id, Email, FullName, Role, EmailConfirmedAt, CreatedAt, UpdatedAt }
