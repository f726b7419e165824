//! Test utilities for database testing.
//!
//! Every test gets its own in-memory SQLite database with all migrations
//! applied, plus helpers for the tenant, user and asset fixtures the engines
//! need.

#![allow(dead_code)]

use anyhow::Result;
use maintenance_api::assets::{AssetService, NewAsset};
use maintenance_api::auth::ActorContext;
use maintenance_api::config::{AppConfig, WorkOrderConfig};
use maintenance_api::models::{Role, asset};
use maintenance_api::repositories::{
    TenantRepository,
    tenant::NewTenant,
    user::{NewUser, UserRepository},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-operator-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Configuration accepted by the auth middleware in API tests.
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec![TEST_TOKEN.to_string()],
        ..AppConfig::default()
    }
}

pub fn policy() -> WorkOrderConfig {
    WorkOrderConfig::default()
}

/// Creates a tenant with a unique slug and returns its id.
pub async fn create_tenant(db: &DatabaseConnection) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let tenant = TenantRepository::new(db)
        .create(NewTenant {
            name: "Test Plant".to_string(),
            slug: format!("plant-{}", id.simple()),
            primary_domain: None,
            plan: None,
        })
        .await?;
    Ok(tenant.id)
}

/// Creates an active user with the given role and returns its actor context.
pub async fn create_actor(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    role: Role,
) -> Result<ActorContext> {
    let user = UserRepository::new(db)
        .create(
            tenant_id,
            NewUser {
                email: format!("{}@plant.test", Uuid::new_v4().simple()),
                full_name: Some(format!("{role} user")),
                role,
                is_active: true,
            },
        )
        .await?;

    Ok(ActorContext {
        tenant_id,
        user_id: user.id,
        role,
    })
}

/// Creates a healthy asset with the given code.
pub async fn create_asset(
    db: &DatabaseConnection,
    actor: &ActorContext,
    code: &str,
) -> Result<asset::Model> {
    let asset = AssetService::new(db)
        .create(
            actor,
            NewAsset {
                name: format!("Asset {code}"),
                code: code.to_string(),
                location: Some("Hall A".to_string()),
                ..NewAsset::default()
            },
        )
        .await?;
    Ok(asset)
}

/// A tenant with an admin actor, the most common starting point.
pub async fn admin_fixture(db: &DatabaseConnection) -> Result<ActorContext> {
    let tenant_id = create_tenant(db).await?;
    create_actor(db, tenant_id, Role::Admin).await
}
