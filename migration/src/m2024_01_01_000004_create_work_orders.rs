//! Migration to create the work_orders table.
//!
//! User references are weak: deleting a user clears them instead of
//! cascading. The generated work order number is globally unique.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkOrders::TenantId).uuid().not_null())
                    .col(ColumnDef::new(WorkOrders::AssetId).uuid().null())
                    .col(ColumnDef::new(WorkOrders::Title).text().not_null())
                    .col(ColumnDef::new(WorkOrders::WorkOrderNumber).text().not_null())
                    .col(ColumnDef::new(WorkOrders::Description).text().null())
                    .col(
                        ColumnDef::new(WorkOrders::Status)
                            .text()
                            .not_null()
                            .default("new"),
                    )
                    .col(
                        ColumnDef::new(WorkOrders::Priority)
                            .text()
                            .not_null()
                            .default("low"),
                    )
                    .col(ColumnDef::new(WorkOrders::ReportedByUserId).uuid().null())
                    .col(ColumnDef::new(WorkOrders::AssignedToUserId).uuid().null())
                    .col(ColumnDef::new(WorkOrders::CompletedByUserId).uuid().null())
                    .col(ColumnDef::new(WorkOrders::CompletionNotes).text().null())
                    .col(ColumnDef::new(WorkOrders::SignedByName).text().null())
                    .col(
                        ColumnDef::new(WorkOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkOrders::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkOrders::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_orders_tenant_id")
                            .from(WorkOrders::Table, WorkOrders::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_orders_asset_id")
                            .from(WorkOrders::Table, WorkOrders::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_orders_reported_by")
                            .from(WorkOrders::Table, WorkOrders::ReportedByUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_orders_assigned_to")
                            .from(WorkOrders::Table, WorkOrders::AssignedToUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_orders_completed_by")
                            .from(WorkOrders::Table, WorkOrders::CompletedByUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_work_orders_number")
                    .table(WorkOrders::Table)
                    .col(WorkOrders::WorkOrderNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Dashboard stats and list filters
        manager
            .create_index(
                Index::create()
                    .name("idx_work_orders_tenant_status")
                    .table(WorkOrders::Table)
                    .col(WorkOrders::TenantId)
                    .col(WorkOrders::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Asset status synchronization
        manager
            .create_index(
                Index::create()
                    .name("idx_work_orders_tenant_asset")
                    .table(WorkOrders::Table)
                    .col(WorkOrders::TenantId)
                    .col(WorkOrders::AssetId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkOrders {
    Table,
    Id,
    TenantId,
    AssetId,
    Title,
    WorkOrderNumber,
    Description,
    Status,
    Priority,
    ReportedByUserId,
    AssignedToUserId,
    CompletedByUserId,
    CompletionNotes,
    SignedByName,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
