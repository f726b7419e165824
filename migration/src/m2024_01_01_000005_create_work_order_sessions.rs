//! Migration to create the work_order_sessions table.
//!
//! A partial unique index allows at most one open session (no `end_time`)
//! per work order and user, while closed sessions accumulate as history.

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
                    .table(WorkOrderSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkOrderSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkOrderSessions::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(WorkOrderSessions::WorkOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WorkOrderSessions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(WorkOrderSessions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkOrderSessions::EndTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_order_sessions_tenant_id")
                            .from(WorkOrderSessions::Table, WorkOrderSessions::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_order_sessions_work_order_id")
                            .from(WorkOrderSessions::Table, WorkOrderSessions::WorkOrderId)
                            .to(WorkOrders::Table, WorkOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_order_sessions_user_id")
                            .from(WorkOrderSessions::Table, WorkOrderSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_work_order_sessions_active \
                 ON work_order_sessions (work_order_id, user_id) \
                 WHERE end_time IS NULL"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "DROP INDEX IF EXISTS idx_work_order_sessions_active".to_string(),
            ))
            .await?;

        manager
            .drop_table(Table::drop().table(WorkOrderSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkOrderSessions {
    Table,
    Id,
    TenantId,
    WorkOrderId,
    UserId,
    StartTime,
    EndTime,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum WorkOrders {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
