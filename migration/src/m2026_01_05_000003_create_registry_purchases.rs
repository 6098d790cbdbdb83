//! Migration to create the registry_purchases table.
//!
//! One row per Shopify order line item reconciled against a registry item.
//! The unique (order_id, line_item_id) index is the concurrency gate that
//! makes webhook redelivery idempotent; it is correctness, not tuning.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RegistryPurchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegistryPurchases::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::RegistryItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RegistryPurchases::OrderId).text().not_null())
                    .col(
                        ColumnDef::new(RegistryPurchases::LineItemId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::CurrencyCode)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::PurchaserName)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::PurchaserEmail)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(RegistryPurchases::GiftMessage).text().null())
                    .col(
                        ColumnDef::new(RegistryPurchases::PaymentStatus)
                            .text()
                            .not_null()
                            .default("paid"),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::FulfillmentStatus)
                            .text()
                            .not_null()
                            .default("unfulfilled"),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::IsGroupGift)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RegistryPurchases::GroupGiftId).uuid().null())
                    .col(
                        ColumnDef::new(RegistryPurchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RegistryPurchases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registry_purchases_registry_item_id")
                            .from(RegistryPurchases::Table, RegistryPurchases::RegistryItemId)
                            .to(RegistryItems::Table, RegistryItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registry_purchases_order_line_item")
                    .table(RegistryPurchases::Table)
                    .col(RegistryPurchases::OrderId)
                    .col(RegistryPurchases::LineItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Storefront reads purchases per item newest-first
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_registry_purchases_item_created ON registry_purchases (registry_item_id, created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_registry_purchases_order_line_item")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_registry_purchases_item_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(RegistryPurchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RegistryPurchases {
    Table,
    Id,
    RegistryItemId,
    OrderId,
    LineItemId,
    Quantity,
    UnitPrice,
    TotalAmount,
    CurrencyCode,
    PurchaserName,
    PurchaserEmail,
    GiftMessage,
    PaymentStatus,
    FulfillmentStatus,
    IsGroupGift,
    GroupGiftId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RegistryItems {
    Table,
    Id,
}
