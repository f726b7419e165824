//! # Asset Management
//!
//! Tenant-scoped CRUD for maintained equipment. Work orders and PM schedules
//! hold a weak reference to an asset: deleting the asset clears that link in
//! the same transaction instead of removing them.

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde_json::Value as JsonValue;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::error::DomainError;
use crate::models::AssetStatus;
use crate::models::asset::{ActiveModel, Model};
use crate::repositories::{AssetRepository, PmScheduleRepository, WorkOrderRepository};

const ENTITY: &str = "asset";

#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub name: String,
    pub code: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<AssetStatus>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
    pub technical_specs: Option<JsonValue>,
}

/// Partial update. `None` leaves a field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub location: Option<Option<String>>,
    pub category: Option<Option<String>>,
    /// Snapshot only, the next work-order change re-derives it
    pub status: Option<AssetStatus>,
    pub manufacturer: Option<Option<String>>,
    pub model: Option<Option<String>>,
    pub serial_number: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub technical_specs: Option<Option<JsonValue>>,
}

pub struct AssetService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AssetService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id))]
    pub async fn create(&self, actor: &ActorContext, input: NewAsset) -> Result<Model, DomainError> {
        let name = required("name", &input.name)?;
        let code = required("code", &input.code)?;
        let now = Utc::now().fixed_offset();

        let asset = ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(actor.tenant_id),
            name: Set(name),
            code: Set(code),
            location: Set(input.location),
            category: Set(input.category),
            status: Set(input.status.unwrap_or_default().as_str().to_string()),
            manufacturer: Set(input.manufacturer),
            model: Set(input.model),
            serial_number: Set(input.serial_number),
            notes: Set(input.notes),
            technical_specs: Set(input.technical_specs),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = AssetRepository::new(self.db)
            .insert(asset)
            .await
            .map_err(|err| duplicate_code(err.into()))?;

        info!(asset_id = %created.id, code = %created.code, "Created asset");
        Ok(created)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Model, DomainError> {
        AssetRepository::new(self.db)
            .find(tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))
    }

    pub async fn list(&self, tenant_id: Uuid, skip: u64, limit: u64) -> Result<Vec<Model>, DomainError> {
        Ok(AssetRepository::new(self.db)
            .list(tenant_id, skip, limit)
            .await?)
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, asset_id = %id))]
    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        changes: AssetUpdate,
    ) -> Result<Model, DomainError> {
        let repo = AssetRepository::new(self.db);
        let current = repo
            .find(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY))?;

        let mut asset: ActiveModel = current.into();
        if let Some(name) = changes.name.as_deref() {
            asset.name = Set(required("name", name)?);
        }
        if let Some(code) = changes.code.as_deref() {
            asset.code = Set(required("code", code)?);
        }
        if let Some(location) = changes.location {
            asset.location = Set(location);
        }
        if let Some(category) = changes.category {
            asset.category = Set(category);
        }
        if let Some(status) = changes.status {
            asset.status = Set(status.as_str().to_string());
        }
        if let Some(manufacturer) = changes.manufacturer {
            asset.manufacturer = Set(manufacturer);
        }
        if let Some(model) = changes.model {
            asset.model = Set(model);
        }
        if let Some(serial_number) = changes.serial_number {
            asset.serial_number = Set(serial_number);
        }
        if let Some(notes) = changes.notes {
            asset.notes = Set(notes);
        }
        if let Some(technical_specs) = changes.technical_specs {
            asset.technical_specs = Set(technical_specs);
        }
        asset.updated_at = Set(Utc::now().fixed_offset());

        let updated = repo
            .update(asset)
            .await
            .map_err(|err| duplicate_code(err.into()))?;
        info!("Updated asset");
        Ok(updated)
    }

    /// Delete an asset and unlink its work orders and schedules.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, asset_id = %id))]
    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;
        let assets = AssetRepository::new(&txn);

        if !assets.exists(actor.tenant_id, id).await? {
            return Err(DomainError::not_found(ENTITY));
        }

        let work_orders = WorkOrderRepository::new(&txn)
            .detach_asset(actor.tenant_id, id)
            .await?;
        let schedules = PmScheduleRepository::new(&txn)
            .detach_asset(actor.tenant_id, id)
            .await?;
        assets.delete(actor.tenant_id, id).await?;
        txn.commit().await?;

        info!(
            work_orders_detached = work_orders,
            schedules_detached = schedules,
            "Deleted asset"
        );
        Ok(())
    }
}

/// Reject references to assets outside the tenant.
pub(crate) async fn ensure_exists<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
) -> Result<(), DomainError> {
    if AssetRepository::new(conn).exists(tenant_id, asset_id).await? {
        Ok(())
    } else {
        Err(DomainError::validation("asset_id", "asset not found"))
    }
}

fn required(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn duplicate_code(err: DomainError) -> DomainError {
    if err.is_unique_violation() {
        DomainError::Conflict("an asset with this code already exists".to_string())
    } else {
        err
    }
}
