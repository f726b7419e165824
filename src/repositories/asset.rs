//! # Asset Repository
//!
//! Tenant-scoped persistence for assets, including the conditional status
//! write used by the asset status synchronizer.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use crate::models::asset::{ActiveModel, Column, Entity as Asset, Model};

pub struct AssetRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AssetRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, asset: ActiveModel) -> Result<Model, DbErr> {
        asset.insert(self.conn).await
    }

    pub async fn find(&self, tenant_id: Uuid, asset_id: Uuid) -> Result<Option<Model>, DbErr> {
        Asset::find_by_id(asset_id)
            .filter(Column::TenantId.eq(tenant_id))
            .one(self.conn)
            .await
    }

    pub async fn exists(&self, tenant_id: Uuid, asset_id: Uuid) -> Result<bool, DbErr> {
        Ok(self.find(tenant_id, asset_id).await?.is_some())
    }

    /// List assets ordered by name.
    pub async fn list(&self, tenant_id: Uuid, skip: u64, limit: u64) -> Result<Vec<Model>, DbErr> {
        Asset::find()
            .filter(Column::TenantId.eq(tenant_id))
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .offset(skip)
            .limit(limit)
            .all(self.conn)
            .await
    }

    /// Persist changed fields of a previously loaded asset.
    pub async fn update(&self, asset: ActiveModel) -> Result<Model, DbErr> {
        asset.update(self.conn).await
    }

    /// Write `status` for one asset. Returns the number of rows touched.
    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
        status: &str,
    ) -> Result<u64, DbErr> {
        let result = Asset::update_many()
            .col_expr(Column::Status, Expr::value(status))
            .col_expr(
                Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(Column::Id.eq(asset_id))
            .filter(Column::TenantId.eq(tenant_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn delete(&self, tenant_id: Uuid, asset_id: Uuid) -> Result<u64, DbErr> {
        let result = Asset::delete_many()
            .filter(Column::Id.eq(asset_id))
            .filter(Column::TenantId.eq(tenant_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
