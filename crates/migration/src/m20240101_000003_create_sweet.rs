//! Create `sweet` table.
//!
//! Stock carries a CHECK >= 0; the purchase path additionally guards the
//! decrement with a conditional UPDATE so the constraint never trips.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sweet::Table)
                    .if_not_exists()
                    .col(uuid(Sweet::Id).primary_key())
                    .col(string_len(Sweet::Name, 128).not_null())
                    .col(text(Sweet::Description).not_null())
                    .col(decimal_len(Sweet::Price, 12, 2).not_null())
                    .col(string_len(Sweet::Category, 32).not_null())
                    .col(string_len(Sweet::ImageUrl, 512).not_null())
                    .col(
                        ColumnDef::new(Sweet::Stock)
                            .integer()
                            .not_null()
                            .check(Expr::col(Sweet::Stock).gte(0)),
                    )
                    .col(timestamp_with_time_zone(Sweet::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Sweet::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Sweet::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Sweet { Table, Id, Name, Description, Price, Category, ImageUrl, Stock, CreatedAt, UpdatedAt }
