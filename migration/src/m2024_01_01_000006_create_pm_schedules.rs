//! Migration to create the pm_schedules and pm_logs tables.
//!
//! Logs are the append-only sign-off history of a schedule and are removed
//! only together with their schedule.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PmSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PmSchedules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PmSchedules::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PmSchedules::AssetId).uuid().null())
                    .col(ColumnDef::new(PmSchedules::Title).text().not_null())
                    .col(ColumnDef::new(PmSchedules::Description).text().null())
                    .col(
                        ColumnDef::new(PmSchedules::FrequencyType)
                            .text()
                            .not_null()
                            .default("days"),
                    )
                    .col(
                        ColumnDef::new(PmSchedules::FrequencyInterval)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(PmSchedules::LastPerformed)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PmSchedules::NextDue)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PmSchedules::AssignedToUserId).uuid().null())
                    .col(
                        ColumnDef::new(PmSchedules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PmSchedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PmSchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pm_schedules_tenant_id")
                            .from(PmSchedules::Table, PmSchedules::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pm_schedules_asset_id")
                            .from(PmSchedules::Table, PmSchedules::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pm_schedules_assigned_to")
                            .from(PmSchedules::Table, PmSchedules::AssignedToUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pm_schedules_tenant_next_due")
                    .table(PmSchedules::Table)
                    .col(PmSchedules::TenantId)
                    .col(PmSchedules::NextDue)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PmLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PmLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PmLogs::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PmLogs::PmScheduleId).uuid().not_null())
                    .col(
                        ColumnDef::new(PmLogs::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PmLogs::CompletedByUserId).uuid().null())
                    .col(ColumnDef::new(PmLogs::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pm_logs_tenant_id")
                            .from(PmLogs::Table, PmLogs::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pm_logs_pm_schedule_id")
                            .from(PmLogs::Table, PmLogs::PmScheduleId)
                            .to(PmSchedules::Table, PmSchedules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pm_logs_completed_by")
                            .from(PmLogs::Table, PmLogs::CompletedByUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pm_logs_schedule_completed")
                    .table(PmLogs::Table)
                    .col(PmLogs::PmScheduleId)
                    .col(PmLogs::CompletedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PmLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PmSchedules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PmSchedules {
    Table,
    Id,
    TenantId,
    AssetId,
    Title,
    Description,
    FrequencyType,
    FrequencyInterval,
    LastPerformed,
    NextDue,
    AssignedToUserId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PmLogs {
    Table,
    Id,
    TenantId,
    PmScheduleId,
    CompletedAt,
    CompletedByUserId,
    Notes,
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
