//! PmSchedule entity model
//!
//! This module contains the SeaORM entity model for the pm_schedules table,
//! recurring preventive-maintenance tasks advanced by sign-off.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Preventive-maintenance schedule
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pm_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,

    pub asset_id: Option<Uuid>,

    pub title: String,

    pub description: Option<String>,

    /// Cadence name (`weekly`, `6 monthly`, ...) or legacy unit (`days`, `weeks`, ...)
    pub frequency_type: String,

    /// Multiplier for legacy units, fallback day count otherwise
    pub frequency_interval: i32,

    pub last_performed: Option<DateTimeWithTimeZone>,

    pub next_due: Option<DateTimeWithTimeZone>,

    pub assigned_to_user_id: Option<Uuid>,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pm_log::Entity")]
    Logs,
}

impl Related<super::pm_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
