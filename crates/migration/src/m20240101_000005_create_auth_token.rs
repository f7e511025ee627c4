//! Create `auth_token` table.
//!
//! One-shot tokens backing both email verification (`signup`) and password
//! reset (`recovery`). Consumed tokens keep their row for auditability.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthToken::Table)
                    .if_not_exists()
                    .col(uuid(AuthToken::Id).primary_key())
                    .col(uuid(AuthToken::UserId).not_null())
                    .col(string_len(AuthToken::Token, 64).unique_key().not_null())
                    .col(string_len(AuthToken::Purpose, 16).not_null())
                    .col(timestamp_with_time_zone(AuthToken::ExpiresAt).not_null())
                    .col(
                        ColumnDef::new(AuthToken::ConsumedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(AuthToken::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_token_profile")
                            .from(AuthToken::Table, AuthToken::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuthToken::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuthToken { Table, Id, UserId, Token, Purpose, ExpiresAt, ConsumedAt, CreatedAt }

#[derive(DeriveIden)]
enum Profile { Table, Id }
