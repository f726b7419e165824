//! Asset entity model
//!
//! This module contains the SeaORM entity model for the assets table.
//! `status` is derived from open work orders by the asset status
//! synchronizer.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

/// Asset entity representing a piece of maintained equipment
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    /// Unique identifier for the asset (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning tenant
    pub tenant_id: Uuid,

    /// Human-readable asset name
    pub name: String,

    /// Asset code, unique within the tenant
    pub code: String,

    pub location: Option<String>,

    pub category: Option<String>,

    /// Health status (`Healthy`, `Running with issues`, `Breakdown`)
    pub status: String,

    pub manufacturer: Option<String>,

    pub model: Option<String>,

    pub serial_number: Option<String>,

    pub notes: Option<String>,

    /// Free-form technical specification map
    #[sea_orm(column_type = "JsonBinary")]
    pub technical_specs: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_order::Entity")]
    WorkOrders,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
