//! WorkOrder entity model
//!
//! This module contains the SeaORM entity model for the work_orders table.
//! Status and priority are stored in canonical lower-case form; see
//! [`crate::models::WorkOrderStatus`] and [`crate::models::Priority`].

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// WorkOrder entity representing a unit of maintenance work
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    /// Unique identifier for the work order (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning tenant
    pub tenant_id: Uuid,

    /// Asset whose health this work order influences
    pub asset_id: Option<Uuid>,

    pub title: String,

    /// Display number, e.g. `WO-240115-0930-7KQ2`
    #[sea_orm(unique)]
    pub work_order_number: String,

    pub description: Option<String>,

    /// Lifecycle status
    pub status: String,

    pub priority: String,

    /// User who created the work order
    pub reported_by_user_id: Option<Uuid>,

    /// Set when the work order enters `in_progress`
    pub assigned_to_user_id: Option<Uuid>,

    /// Set when the work order enters `completed`
    pub completed_by_user_id: Option<Uuid>,

    pub completion_notes: Option<String>,

    pub signed_by_name: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    pub started_at: Option<DateTimeWithTimeZone>,

    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
    #[sea_orm(has_many = "super::work_order_session::Entity")]
    Sessions,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::work_order_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
