//! # User Repository
//!
//! Resolves acting users. Lookups are always tenant-filtered so a user id
//! from another tenant behaves exactly like an unknown one.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::models::Role;
use crate::models::user::{ActiveModel, Column, Entity as User, Model};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

pub struct UserRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, tenant_id: Uuid, request: NewUser) -> Result<Model, DbErr> {
        let user = ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            email: Set(request.email.trim().to_lowercase()),
            full_name: Set(request.full_name),
            role: Set(request.role.as_str().to_string()),
            is_active: Set(request.is_active),
            created_at: Set(Utc::now().fixed_offset()),
        };

        user.insert(self.conn).await
    }

    /// Find a user by id within the given tenant.
    pub async fn find_in_tenant(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Model>, DbErr> {
        User::find_by_id(user_id)
            .filter(Column::TenantId.eq(tenant_id))
            .one(self.conn)
            .await
    }
}
