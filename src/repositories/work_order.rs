//! # WorkOrder Repository
//!
//! Tenant-scoped persistence and aggregate queries for work orders.
//! Status and priority comparisons go through `LOWER(...)` so legacy
//! mixed-case rows are matched and grouped with canonical ones.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};
use uuid::Uuid;

use super::contains_pattern;
use crate::models::work_order::{ActiveModel, Column, Entity as WorkOrder, Model};
use crate::models::{Priority, WorkOrderStatus};

/// Filters accepted by [`WorkOrderRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub skip: u64,
    pub limit: u64,
}

fn lower(column: Column) -> SimpleExpr {
    Func::lower(Expr::col(column)).into()
}

fn is_active() -> SimpleExpr {
    Expr::expr(lower(Column::Status)).is_not_in(WorkOrderStatus::terminal_values())
}

pub struct WorkOrderRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> WorkOrderRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, work_order: ActiveModel) -> Result<Model, DbErr> {
        work_order.insert(self.conn).await
    }

    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Model>, DbErr> {
        WorkOrder::find_by_id(id)
            .filter(Column::TenantId.eq(tenant_id))
            .one(self.conn)
            .await
    }

    /// Newest first.
    pub async fn list(&self, tenant_id: Uuid, filter: &WorkOrderFilter) -> Result<Vec<Model>, DbErr> {
        let mut query = WorkOrder::find().filter(Column::TenantId.eq(tenant_id));

        if let Some(status) = filter.status {
            query = query.filter(Expr::expr(lower(Column::Status)).eq(status.as_str()));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(Expr::expr(lower(Column::Priority)).eq(priority.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            query = query.filter(
                Expr::expr(lower(Column::Title))
                    .like(LikeExpr::new(contains_pattern(search)).escape('\\')),
            );
        }

        query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .offset(filter.skip)
            .limit(filter.limit)
            .all(self.conn)
            .await
    }

    pub async fn update(&self, work_order: ActiveModel) -> Result<Model, DbErr> {
        work_order.update(self.conn).await
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let result = WorkOrder::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::TenantId.eq(tenant_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Priorities of the non-terminal work orders linked to an asset.
    pub async fn active_priorities_for_asset(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Vec<String>, DbErr> {
        WorkOrder::find()
            .select_only()
            .column(Column::Priority)
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::AssetId.eq(asset_id))
            .filter(is_active())
            .into_tuple::<String>()
            .all(self.conn)
            .await
    }

    /// Unlink every work order from a deleted asset.
    pub async fn detach_asset(&self, tenant_id: Uuid, asset_id: Uuid) -> Result<u64, DbErr> {
        let result = WorkOrder::update_many()
            .col_expr(Column::AssetId, Expr::value(Option::<Uuid>::None))
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::AssetId.eq(asset_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Non-terminal work order counts keyed by lower-cased status.
    pub async fn count_active_by_status(&self, tenant_id: Uuid) -> Result<Vec<(String, i64)>, DbErr> {
        self.count_active_grouped(tenant_id, Column::Status).await
    }

    /// Non-terminal work order counts keyed by lower-cased priority.
    pub async fn count_active_by_priority(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<(String, i64)>, DbErr> {
        self.count_active_grouped(tenant_id, Column::Priority).await
    }

    async fn count_active_grouped(
        &self,
        tenant_id: Uuid,
        column: Column,
    ) -> Result<Vec<(String, i64)>, DbErr> {
        WorkOrder::find()
            .select_only()
            .column_as(lower(column), "key")
            .column_as(Expr::col(Column::Id).count(), "count")
            .filter(Column::TenantId.eq(tenant_id))
            .filter(is_active())
            .group_by(lower(column))
            .into_tuple::<(String, i64)>()
            .all(self.conn)
            .await
    }

    /// Completed work orders whose completion falls at or after `since`.
    pub async fn count_completed_since(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        WorkOrder::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Expr::expr(lower(Column::Status)).eq(WorkOrderStatus::Completed.as_str()))
            .filter(Column::CompletedAt.gte(since.fixed_offset()))
            .count(self.conn)
            .await
    }

    pub async fn count_all(&self, tenant_id: Uuid) -> Result<u64, DbErr> {
        WorkOrder::find()
            .filter(Column::TenantId.eq(tenant_id))
            .count(self.conn)
            .await
    }
}
