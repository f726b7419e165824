//! # WorkOrderSession Repository
//!
//! Presence markers for users working on a work order. A partial unique
//! index guarantees at most one open session per work order and user.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};
use uuid::Uuid;

use crate::models::work_order_session::{ActiveModel, Column, Entity as WorkOrderSession, Model};

pub struct WorkOrderSessionRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> WorkOrderSessionRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_active(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Model>, DbErr> {
        WorkOrderSession::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::WorkOrderId.eq(work_order_id))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::EndTime.is_null())
            .one(self.conn)
            .await
    }

    pub async fn open(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            work_order_id: Set(work_order_id),
            user_id: Set(user_id),
            start_time: Set(now.fixed_offset()),
            end_time: Set(None),
        }
        .insert(self.conn)
        .await
    }

    /// Close every open session of the user on the work order.
    pub async fn close_active(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = WorkOrderSession::update_many()
            .col_expr(Column::EndTime, Expr::value(now.fixed_offset()))
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::WorkOrderId.eq(work_order_id))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::EndTime.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Open sessions for a batch of work orders, oldest first.
    pub async fn active_for(
        &self,
        tenant_id: Uuid,
        work_order_ids: &[Uuid],
    ) -> Result<Vec<Model>, DbErr> {
        if work_order_ids.is_empty() {
            return Ok(Vec::new());
        }

        WorkOrderSession::find()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::WorkOrderId.is_in(work_order_ids.iter().copied()))
            .filter(Column::EndTime.is_null())
            .order_by_asc(Column::StartTime)
            .all(self.conn)
            .await
    }

    pub async fn delete_for_work_order(
        &self,
        tenant_id: Uuid,
        work_order_id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = WorkOrderSession::delete_many()
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::WorkOrderId.eq(work_order_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
