//! # Data Models
//!
//! SeaORM entities for every persisted record plus the closed domain enums
//! their text columns hold.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod asset;
pub mod pm_log;
pub mod pm_schedule;
pub mod status;
pub mod tenant;
pub mod user;
pub mod work_order;
pub mod work_order_session;

pub use asset::Entity as Asset;
pub use pm_log::Entity as PmLog;
pub use pm_schedule::Entity as PmSchedule;
pub use status::{AssetStatus, ParseEnumError, Priority, Role, WorkOrderStatus};
pub use tenant::Entity as Tenant;
pub use user::Entity as User;
pub use work_order::Entity as WorkOrder;
pub use work_order_session::Entity as WorkOrderSession;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "maintenance-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
