//! Secondary indexes for the hot query paths: catalog search/filter and
//! per-user purchase lookups.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_sweet_name")
                    .table(Sweet::Table)
                    .col(Sweet::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sweet_category")
                    .table(Sweet::Table)
                    .col(Sweet::Category)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_user")
                    .table(Purchase::Table)
                    .col(Purchase::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_token_user")
                    .table(AuthToken::Table)
                    .col(AuthToken::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sweet_name").table(Sweet::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sweet_category").table(Sweet::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_purchase_user").table(Purchase::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_auth_token_user").table(AuthToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sweet { Table, Name, Category }

#[derive(DeriveIden)]
enum Purchase { Table, UserId }

#[derive(DeriveIden)]
enum AuthToken { Table, UserId }
