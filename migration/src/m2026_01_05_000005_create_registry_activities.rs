//! Migration to create the registry_activities table.
//!
//! Append-only audit log of reconciliation and registry events, consumed by
//! the analytics/notification collaborators. Rows are never updated.

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
                    .table(RegistryActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegistryActivities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RegistryActivities::RegistryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RegistryActivities::ActorName).text().null())
                    .col(
                        ColumnDef::new(RegistryActivities::ActorEmail)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RegistryActivities::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RegistryActivities::Action).text().not_null())
                    .col(
                        ColumnDef::new(RegistryActivities::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistryActivities::Metadata)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RegistryActivities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registry_activities_registry_id")
                            .from(RegistryActivities::Table, RegistryActivities::RegistryId)
                            .to(Registries::Table, Registries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Activity feed reads newest-first per registry
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_registry_activities_registry_created ON registry_activities (registry_id, created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_registry_activities_registry_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(RegistryActivities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RegistryActivities {
    Table,
    Id,
    RegistryId,
    ActorName,
    ActorEmail,
    IsSystem,
    Action,
    Description,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Registries {
    Table,
    Id,
}
