//! Migration to create the registries table.
//!
//! A registry is the top-level collection a customer builds for an event;
//! items, purchases, contributions, and activities all cascade from it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Registries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Registries::ShopDomain).text().not_null())
                    .col(ColumnDef::new(Registries::CustomerEmail).text().null())
                    .col(ColumnDef::new(Registries::Title).text().not_null())
                    .col(ColumnDef::new(Registries::Slug).text().not_null())
                    .col(
                        ColumnDef::new(Registries::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Registries::EventDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Registries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Registries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Registry URLs are shop-scoped, so the slug must be unique per shop
        manager
            .create_index(
                Index::create()
                    .name("idx_registries_shop_slug")
                    .table(Registries::Table)
                    .col(Registries::ShopDomain)
                    .col(Registries::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_registries_shop_slug").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Registries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Registries {
    Table,
    Id,
    ShopDomain,
    CustomerEmail,
    Title,
    Slug,
    Status,
    EventDate,
    CreatedAt,
    UpdatedAt,
}
