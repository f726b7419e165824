//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities. Every query takes the caller's tenant id as a hard filter.
//!
//! Repositories borrow any [`sea_orm::ConnectionTrait`], so the same code runs on the
//! pool or inside an open transaction.

pub mod asset;
pub mod pm_schedule;
pub mod tenant;
pub mod user;
pub mod work_order;
pub mod work_order_session;

pub use asset::AssetRepository;
pub use pm_schedule::{PmScheduleFilter, PmScheduleRepository};
pub use tenant::TenantRepository;
pub use user::UserRepository;
pub use work_order::{WorkOrderFilter, WorkOrderRepository};
pub use work_order_session::WorkOrderSessionRepository;

/// Escapes LIKE wildcards in user input and wraps it for a substring match.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Pump"), "%pump%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
