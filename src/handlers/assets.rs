//! # Asset API Handlers

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ListResponse, Pagination, double_option, timestamp};
use crate::asset_status::{self, SyncOutcome};
use crate::assets::{AssetService, AssetUpdate, NewAsset};
use crate::auth::{ActorContext, IdentityHeaders};
use crate::error::{ApiError, DomainError};
use crate::models::{AssetStatus, asset};
use crate::server::AppState;

/// Request payload for creating an asset
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAssetRequest {
    #[schema(example = "Main feed pump")]
    pub name: String,
    /// Unique within the tenant
    #[schema(example = "PUMP-001")]
    pub code: String,
    pub location: Option<String>,
    pub category: Option<String>,
    /// Defaults to `Healthy`
    pub status: Option<AssetStatus>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
    /// Free-form technical specification map
    pub technical_specs: Option<JsonValue>,
}

/// Partial update payload for an asset
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    /// Manual snapshot, overwritten by the next work-order change
    pub status: Option<AssetStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub manufacturer: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub model: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub serial_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Object>)]
    pub technical_specs: Option<Option<JsonValue>>,
}

/// Asset representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssetResponse {
    pub id: String,
    pub name: String,
    pub code: String,
    pub location: Option<String>,
    pub category: Option<String>,
    #[schema(example = "Running with issues")]
    pub status: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
    pub technical_specs: Option<JsonValue>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<asset::Model> for AssetResponse {
    fn from(model: asset::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            code: model.code,
            location: model.location,
            category: model.category,
            status: model.status,
            manufacturer: model.manufacturer,
            model: model.model,
            serial_number: model.serial_number,
            notes: model.notes,
            technical_specs: model.technical_specs,
            created_at: timestamp(model.created_at),
            updated_at: timestamp(model.updated_at),
        }
    }
}

/// Result of an explicit status synchronisation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncStatusResponse {
    pub asset_id: String,
    /// Status derived from the asset's active work orders
    pub status: AssetStatus,
    /// Whether the stored value was rewritten
    pub changed: bool,
    /// Stored value before the rewrite
    pub previous_status: Option<String>,
}

/// List assets ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/assets",
    security(("bearer_auth" = [])),
    params(IdentityHeaders, Pagination),
    responses(
        (status = 200, description = "Assets of the tenant", body = ListResponse<AssetResponse>),
        (status = 400, description = "Invalid pagination", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn list_assets(
    State(state): State<AppState>,
    actor: ActorContext,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<ListResponse<AssetResponse>>, ApiError> {
    let Query(pagination) = query?;
    let (skip, limit) = pagination.resolve(&state.config.listing)?;

    let assets = AssetService::new(&state.db)
        .list(actor.tenant_id, skip, limit)
        .await?;

    Ok(Json(ListResponse::new(
        assets.into_iter().map(AssetResponse::from).collect(),
        skip,
        limit,
    )))
}

/// Create an asset
#[utoipa::path(
    post,
    path = "/api/v1/assets",
    security(("bearer_auth" = [])),
    params(IdentityHeaders),
    request_body = CreateAssetRequest,
    responses(
        (status = 201, description = "Asset created", body = AssetResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Asset code already in use", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn create_asset(
    State(state): State<AppState>,
    actor: ActorContext,
    payload: Result<Json<CreateAssetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssetResponse>), ApiError> {
    let Json(request) = payload?;

    let created = AssetService::new(&state.db)
        .create(
            &actor,
            NewAsset {
                name: request.name,
                code: request.code,
                location: request.location,
                category: request.category,
                status: request.status,
                manufacturer: request.manufacturer,
                model: request.model,
                serial_number: request.serial_number,
                notes: request.notes,
                technical_specs: request.technical_specs,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Asset id"), IdentityHeaders),
    responses(
        (status = 200, description = "Asset", body = AssetResponse),
        (status = 404, description = "Asset not found", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn get_asset(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AssetResponse>, ApiError> {
    let Path(id) = path?;
    let asset = AssetService::new(&state.db).get(actor.tenant_id, id).await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/assets/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Asset id"), IdentityHeaders),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Updated asset", body = AssetResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Asset not found", body = ApiError),
        (status = 409, description = "Asset code already in use", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn update_asset(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAssetRequest>, JsonRejection>,
) -> Result<Json<AssetResponse>, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;

    let changes = AssetUpdate {
        name: request.name,
        code: request.code,
        location: request.location,
        category: request.category,
        status: request.status,
        manufacturer: request.manufacturer,
        model: request.model,
        serial_number: request.serial_number,
        notes: request.notes,
        technical_specs: request.technical_specs,
    };
    let updated = AssetService::new(&state.db)
        .update(&actor, id, changes)
        .await?;

    Ok(Json(updated.into()))
}

/// Delete an asset; linked work orders and schedules keep existing unlinked
#[utoipa::path(
    delete,
    path = "/api/v1/assets/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Asset id"), IdentityHeaders),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 404, description = "Asset not found", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn delete_asset(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    AssetService::new(&state.db).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Re-derive the asset status from its active work orders
#[utoipa::path(
    post,
    path = "/api/v1/assets/{id}/sync-status",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Asset id"), IdentityHeaders),
    responses(
        (status = 200, description = "Derived status", body = SyncStatusResponse),
        (status = 404, description = "Asset not found", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn sync_asset_status(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let Path(id) = path?;

    let outcome = asset_status::sync_standalone(&state.db, actor.tenant_id, id).await?;
    let response = match outcome {
        SyncOutcome::Unchanged(status) => SyncStatusResponse {
            asset_id: id.to_string(),
            status,
            changed: false,
            previous_status: None,
        },
        SyncOutcome::Updated { from, to } => SyncStatusResponse {
            asset_id: id.to_string(),
            status: to,
            changed: true,
            previous_status: Some(from),
        },
        SyncOutcome::Skipped | SyncOutcome::AssetMissing => {
            return Err(DomainError::not_found("asset").into());
        }
    };

    Ok(Json(response))
}
