//! Create `purchase` table.
//!
//! `sweet_id` is intentionally NOT a foreign key: deleting a product leaves
//! historical purchases behind as orphaned references.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Purchase::Table)
                    .if_not_exists()
                    .col(uuid(Purchase::Id).primary_key())
                    .col(uuid(Purchase::UserId).not_null())
                    .col(uuid(Purchase::SweetId).not_null())
                    .col(
                        ColumnDef::new(Purchase::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Purchase::Quantity).gt(0)),
                    )
                    .col(decimal_len(Purchase::TotalPrice, 12, 2).not_null())
                    .col(timestamp_with_time_zone(Purchase::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_profile")
                            .from(Purchase::Table, Purchase::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Purchase::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Purchase { Table, Id, UserId, SweetId, Quantity, TotalPrice, CreatedAt }

#[derive(DeriveIden)]
enum Profile { Table, Id }
