//! # PM Schedule Repository
//!
//! Tenant-scoped persistence for preventive-maintenance schedules and their
//! append-only sign-off logs.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use crate::models::pm_log::{
    ActiveModel as PmLogActiveModel, Column as PmLogColumn, Entity as PmLog, Model as PmLogModel,
};
use crate::models::pm_schedule::{ActiveModel, Column, Entity as PmSchedule, Model};

/// Filters accepted by [`PmScheduleRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct PmScheduleFilter {
    pub asset_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub skip: u64,
    pub limit: u64,
}

pub struct PmScheduleRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PmScheduleRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, schedule: ActiveModel) -> Result<Model, DbErr> {
        schedule.insert(self.conn).await
    }

    pub async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Model>, DbErr> {
        PmSchedule::find_by_id(id)
            .filter(Column::TenantId.eq(tenant_id))
            .one(self.conn)
            .await
    }

    /// Soonest due first.
    pub async fn list(&self, tenant_id: Uuid, filter: &PmScheduleFilter) -> Result<Vec<Model>, DbErr> {
        let mut query = PmSchedule::find().filter(Column::TenantId.eq(tenant_id));

        if let Some(asset_id) = filter.asset_id {
            query = query.filter(Column::AssetId.eq(asset_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(Column::IsActive.eq(is_active));
        }

        query
            .order_by_asc(Column::NextDue)
            .order_by_asc(Column::Id)
            .offset(filter.skip)
            .limit(filter.limit)
            .all(self.conn)
            .await
    }

    pub async fn update(&self, schedule: ActiveModel) -> Result<Model, DbErr> {
        schedule.update(self.conn).await
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<u64, DbErr> {
        let result = PmSchedule::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::TenantId.eq(tenant_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Unlink every schedule from a deleted asset.
    pub async fn detach_asset(&self, tenant_id: Uuid, asset_id: Uuid) -> Result<u64, DbErr> {
        let result = PmSchedule::update_many()
            .col_expr(Column::AssetId, Expr::value(Option::<Uuid>::None))
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::AssetId.eq(asset_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn insert_log(&self, log: PmLogActiveModel) -> Result<PmLogModel, DbErr> {
        log.insert(self.conn).await
    }

    /// Sign-off history of one schedule, newest first.
    pub async fn list_logs(
        &self,
        tenant_id: Uuid,
        schedule_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<PmLogModel>, DbErr> {
        PmLog::find()
            .filter(PmLogColumn::TenantId.eq(tenant_id))
            .filter(PmLogColumn::PmScheduleId.eq(schedule_id))
            .order_by_desc(PmLogColumn::CompletedAt)
            .order_by_desc(PmLogColumn::Id)
            .offset(skip)
            .limit(limit)
            .all(self.conn)
            .await
    }

    /// Logs are only removed together with their schedule.
    pub async fn delete_logs(&self, tenant_id: Uuid, schedule_id: Uuid) -> Result<u64, DbErr> {
        let result = PmLog::delete_many()
            .filter(PmLogColumn::TenantId.eq(tenant_id))
            .filter(PmLogColumn::PmScheduleId.eq(schedule_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
