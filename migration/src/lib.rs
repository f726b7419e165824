//! Database migrations for the maintenance API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_01_01_000001_create_tenants;
mod m2024_01_01_000002_create_users;
mod m2024_01_01_000003_create_assets;
mod m2024_01_01_000004_create_work_orders;
mod m2024_01_01_000005_create_work_order_sessions;
mod m2024_01_01_000006_create_pm_schedules;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_01_01_000001_create_tenants::Migration),
            Box::new(m2024_01_01_000002_create_users::Migration),
            Box::new(m2024_01_01_000003_create_assets::Migration),
            Box::new(m2024_01_01_000004_create_work_orders::Migration),
            Box::new(m2024_01_01_000005_create_work_order_sessions::Migration),
            Box::new(m2024_01_01_000006_create_pm_schedules::Migration),
        ]
    }
}
