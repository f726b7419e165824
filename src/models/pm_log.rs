//! PmLog entity model
//!
//! Append-only sign-off history of a PM schedule.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pm_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,

    pub pm_schedule_id: Uuid,

    pub completed_at: DateTimeWithTimeZone,

    pub completed_by_user_id: Option<Uuid>,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pm_schedule::Entity",
        from = "Column::PmScheduleId",
        to = "super::pm_schedule::Column::Id"
    )]
    Schedule,
}

impl Related<super::pm_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
