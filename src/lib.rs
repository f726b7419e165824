//! # Maintenance API Library
//!
//! Multi-tenant maintenance backend: the work order lifecycle engine, the
//! asset status synchronizer and the preventive-maintenance scheduler, plus
//! the axum surface that exposes them.

pub mod asset_status;
pub mod assets;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pm;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod work_orders;
pub use migration;
