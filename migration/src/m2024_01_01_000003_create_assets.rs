//! Migration to create the assets table.
//!
//! Asset status is derived from open work orders; the column default keeps
//! freshly registered equipment healthy until a work order says otherwise.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Assets::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Assets::Name).text().not_null())
                    .col(ColumnDef::new(Assets::Code).text().not_null())
                    .col(ColumnDef::new(Assets::Location).text().null())
                    .col(ColumnDef::new(Assets::Category).text().null())
                    .col(
                        ColumnDef::new(Assets::Status)
                            .text()
                            .not_null()
                            .default("Healthy"),
                    )
                    .col(ColumnDef::new(Assets::Manufacturer).text().null())
                    .col(ColumnDef::new(Assets::Model).text().null())
                    .col(ColumnDef::new(Assets::SerialNumber).text().null())
                    .col(ColumnDef::new(Assets::Notes).text().null())
                    .col(ColumnDef::new(Assets::TechnicalSpecs).json_binary().null())
                    .col(
                        ColumnDef::new(Assets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Assets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_tenant_id")
                            .from(Assets::Table, Assets::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assets_tenant_code")
                    .table(Assets::Table)
                    .col(Assets::TenantId)
                    .col(Assets::Code)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
    TenantId,
    Name,
    Code,
    Location,
    Category,
    Status,
    Manufacturer,
    Model,
    SerialNumber,
    Notes,
    TechnicalSpecs,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
