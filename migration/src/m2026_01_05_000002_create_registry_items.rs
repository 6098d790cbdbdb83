//! Migration to create the registry_items table.
//!
//! Each row is one product/variant entry in a registry with a target quantity
//! and the cumulative quantity purchased against it. quantity_purchased is
//! only ever mutated through the purchase ledger's atomic increment.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RegistryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegistryItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RegistryItems::RegistryId).uuid().not_null())
                    .col(ColumnDef::new(RegistryItems::ProductId).text().not_null())
                    .col(ColumnDef::new(RegistryItems::VariantId).text().null())
                    .col(ColumnDef::new(RegistryItems::Title).text().not_null())
                    .col(ColumnDef::new(RegistryItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(RegistryItems::QuantityPurchased)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RegistryItems::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryItems::CurrencyCode)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryItems::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(RegistryItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RegistryItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registry_items_registry_id")
                            .from(RegistryItems::Table, RegistryItems::RegistryId)
                            .to(Registries::Table, Registries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registry_items_registry")
                    .table(RegistryItems::Table)
                    .col(RegistryItems::RegistryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_registry_items_registry").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RegistryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RegistryItems {
    Table,
    Id,
    RegistryId,
    ProductId,
    VariantId,
    Title,
    Quantity,
    QuantityPurchased,
    UnitPrice,
    CurrencyCode,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Registries {
    Table,
    Id,
}
