//! Migration to create the group_gift_contributions table.
//!
//! Contributions pool partial amounts toward the aggregating group-gift
//! purchase. Refunded rows are kept for the audit trail and excluded from
//! completion sums by payment_status.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GroupGiftContributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupGiftContributions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::PurchaseId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::ContributorName)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::ContributorEmail)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::CurrencyCode)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::PaymentStatus)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::ShowAmount)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(GroupGiftContributions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_gift_contributions_purchase_id")
                            .from(
                                GroupGiftContributions::Table,
                                GroupGiftContributions::PurchaseId,
                            )
                            .to(RegistryPurchases::Table, RegistryPurchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Completion state sums completed contributions per purchase
        manager
            .create_index(
                Index::create()
                    .name("idx_group_gift_contributions_purchase_status")
                    .table(GroupGiftContributions::Table)
                    .col(GroupGiftContributions::PurchaseId)
                    .col(GroupGiftContributions::PaymentStatus)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_group_gift_contributions_purchase_status")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(GroupGiftContributions::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum GroupGiftContributions {
    Table,
    Id,
    PurchaseId,
    ContributorName,
    ContributorEmail,
    IsAnonymous,
    Amount,
    CurrencyCode,
    PaymentStatus,
    ShowAmount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RegistryPurchases {
    Table,
    Id,
}
