//! # Tenant Repository
//!
//! Tenants are provisioned out of band; the service only needs to create
//! them for fixtures and look them up.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use uuid::Uuid;

use crate::models::tenant::{ActiveModel, Entity as Tenant, Model};

/// Request data for creating a new tenant
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub primary_domain: Option<String>,
    pub plan: Option<String>,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> TenantRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, request: NewTenant) -> Result<Model, DbErr> {
        let tenant = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(request.slug),
            primary_domain: Set(request.primary_domain),
            plan: Set(request.plan.unwrap_or_else(|| "free".to_string())),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let tenant = tenant.insert(self.conn).await?;
        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");
        Ok(tenant)
    }

    pub async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Model>, DbErr> {
        Tenant::find_by_id(tenant_id).one(self.conn).await
    }
}
