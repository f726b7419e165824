//! # Work Order API Handlers
//!
//! Thin HTTP adapters over [`crate::work_orders::WorkOrderService`].

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ListResponse, Pagination, double_option, timestamp};
use crate::auth::{ActorContext, IdentityHeaders};
use crate::error::{ApiError, DomainError};
use crate::models::{Priority, WorkOrderStatus, work_order_session};
use crate::repositories::WorkOrderFilter;
use crate::server::AppState;
use crate::work_orders::{
    NewWorkOrder, WorkOrderDetails, WorkOrderService, WorkOrderStats, WorkOrderUpdate,
};

/// Request payload for creating a work order
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkOrderRequest {
    /// Short summary of the work (required)
    #[schema(example = "Fix Pump")]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `low`
    pub priority: Option<Priority>,
    /// Asset the work order concerns; must belong to the tenant
    pub asset_id: Option<Uuid>,
}

/// Partial update payload. Omitted fields are left untouched, `null` clears
/// a nullable field.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateWorkOrderRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// Target lifecycle status
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub asset_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub completion_notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub signed_by_name: Option<Option<String>>,
    /// Completion time override (RFC 3339)
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "2024-01-15T16:00:00Z")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateWorkOrderRequest> for WorkOrderUpdate {
    fn from(request: UpdateWorkOrderRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            status: request.status,
            priority: request.priority,
            asset_id: request.asset_id,
            completion_notes: request.completion_notes,
            signed_by_name: request.signed_by_name,
            completed_at: request.completed_at,
        }
    }
}

/// Query parameters for listing work orders
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListWorkOrdersQuery {
    /// Filter by status (case-insensitive)
    pub status: Option<String>,
    /// Filter by priority (case-insensitive)
    pub priority: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// A user currently working on a work order
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveSessionResponse {
    pub id: String,
    pub user_id: String,
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub start_time: String,
}

impl From<work_order_session::Model> for ActiveSessionResponse {
    fn from(model: work_order_session::Model) -> Self {
        Self {
            id: model.id.to_string(),
            user_id: model.user_id.to_string(),
            start_time: timestamp(model.start_time),
        }
    }
}

/// Work order representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkOrderResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    #[schema(example = "WO-240115-1030-7KQ2")]
    pub work_order_number: String,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "in_progress")]
    pub status: String,
    #[schema(example = "critical")]
    pub priority: String,
    pub asset_id: Option<String>,
    pub reported_by_user_id: Option<String>,
    pub assigned_to_user_id: Option<String>,
    pub completed_by_user_id: Option<String>,
    pub completion_notes: Option<String>,
    pub signed_by_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    /// Users currently joined to the work order
    pub active_sessions: Vec<ActiveSessionResponse>,
}

impl From<WorkOrderDetails> for WorkOrderResponse {
    fn from(details: WorkOrderDetails) -> Self {
        let model = details.work_order;
        Self {
            id: model.id.to_string(),
            work_order_number: model.work_order_number,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            asset_id: model.asset_id.map(|id| id.to_string()),
            reported_by_user_id: model.reported_by_user_id.map(|id| id.to_string()),
            assigned_to_user_id: model.assigned_to_user_id.map(|id| id.to_string()),
            completed_by_user_id: model.completed_by_user_id.map(|id| id.to_string()),
            completion_notes: model.completion_notes,
            signed_by_name: model.signed_by_name,
            created_at: timestamp(model.created_at),
            updated_at: timestamp(model.updated_at),
            started_at: model.started_at.map(timestamp),
            completed_at: model.completed_at.map(timestamp),
            active_sessions: details
                .active_sessions
                .into_iter()
                .map(ActiveSessionResponse::from)
                .collect(),
        }
    }
}

/// List work orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    security(("bearer_auth" = [])),
    params(IdentityHeaders, ListWorkOrdersQuery),
    responses(
        (status = 200, description = "Work orders of the tenant", body = ListResponse<WorkOrderResponse>),
        (status = 400, description = "Invalid filter or pagination", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User not allowed in tenant", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    actor: ActorContext,
    query: Result<Query<ListWorkOrdersQuery>, QueryRejection>,
) -> Result<Json<ListResponse<WorkOrderResponse>>, ApiError> {
    let Query(query) = query?;
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .resolve(&state.config.listing)?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<WorkOrderStatus>)
        .transpose()
        .map_err(|err| DomainError::validation("status", err.to_string()))?;
    let priority = query
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()
        .map_err(|err| DomainError::validation("priority", err.to_string()))?;

    let filter = WorkOrderFilter {
        status,
        priority,
        search: query.search,
        skip,
        limit,
    };

    let work_orders = WorkOrderService::new(&state.db, &state.config.work_orders)
        .list(actor.tenant_id, &filter)
        .await?;

    Ok(Json(ListResponse::new(
        work_orders.into_iter().map(WorkOrderResponse::from).collect(),
        skip,
        limit,
    )))
}

/// Create a work order in status `new`
#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    security(("bearer_auth" = [])),
    params(IdentityHeaders),
    request_body = CreateWorkOrderRequest,
    responses(
        (status = 201, description = "Work order created", body = WorkOrderResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User not allowed in tenant", body = ApiError),
        (status = 409, description = "No unique work order number could be allocated", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    actor: ActorContext,
    payload: Result<Json<CreateWorkOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkOrderResponse>), ApiError> {
    let Json(request) = payload?;

    let created = WorkOrderService::new(&state.db, &state.config.work_orders)
        .create(
            &actor,
            NewWorkOrder {
                title: request.title,
                description: request.description,
                priority: request.priority,
                asset_id: request.asset_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Dashboard counters for the tenant
#[utoipa::path(
    get,
    path = "/api/v1/work-orders/stats",
    security(("bearer_auth" = [])),
    params(IdentityHeaders),
    responses(
        (status = 200, description = "Work order counters", body = WorkOrderStats, example = json!({
            "active_total": 3,
            "total": 10,
            "by_status": {"new": 1, "in_progress": 2, "completed": 1},
            "by_priority": {"low": 1, "critical": 2}
        })),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User not allowed in tenant", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn work_order_stats(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<WorkOrderStats>, ApiError> {
    let stats = WorkOrderService::new(&state.db, &state.config.work_orders)
        .stats(actor.tenant_id)
        .await?;

    Ok(Json(stats))
}

/// Fetch one work order with its active sessions
#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Work order id"), IdentityHeaders),
    responses(
        (status = 200, description = "Work order", body = WorkOrderResponse),
        (status = 404, description = "Work order not found", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WorkOrderResponse>, ApiError> {
    let Path(id) = path?;

    let details = WorkOrderService::new(&state.db, &state.config.work_orders)
        .get(actor.tenant_id, id)
        .await?;

    Ok(Json(details.into()))
}

/// Partially update a work order, applying status transition side effects
#[utoipa::path(
    put,
    path = "/api/v1/work-orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Work order id"), IdentityHeaders),
    request_body = UpdateWorkOrderRequest,
    responses(
        (status = 200, description = "Updated work order", body = WorkOrderResponse),
        (status = 400, description = "Validation failed or transition not allowed", body = ApiError),
        (status = 404, description = "Work order not found", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn update_work_order(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateWorkOrderRequest>, JsonRejection>,
) -> Result<Json<WorkOrderResponse>, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;

    let updated = WorkOrderService::new(&state.db, &state.config.work_orders)
        .update(&actor, id, request.into())
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a work order (admin, manager or owner only)
#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Work order id"), IdentityHeaders),
    responses(
        (status = 204, description = "Work order deleted"),
        (status = 403, description = "Role may not delete work orders", body = ApiError),
        (status = 404, description = "Work order not found", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn delete_work_order(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;

    WorkOrderService::new(&state.db, &state.config.work_orders)
        .delete(&actor, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Join a work order (idempotent)
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/join",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Work order id"), IdentityHeaders),
    responses(
        (status = 200, description = "Work order with active sessions", body = WorkOrderResponse),
        (status = 404, description = "Work order not found", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn join_work_order(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WorkOrderResponse>, ApiError> {
    let Path(id) = path?;

    let details = WorkOrderService::new(&state.db, &state.config.work_orders)
        .join(&actor, id)
        .await?;

    Ok(Json(details.into()))
}

/// Leave a work order, closing the caller's active sessions
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/leave",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Work order id"), IdentityHeaders),
    responses(
        (status = 200, description = "Work order with active sessions", body = WorkOrderResponse),
        (status = 404, description = "Work order not found", body = ApiError)
    ),
    tag = "work-orders"
)]
pub async fn leave_work_order(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WorkOrderResponse>, ApiError> {
    let Path(id) = path?;

    let details = WorkOrderService::new(&state.db, &state.config.work_orders)
        .leave(&actor, id)
        .await?;

    Ok(Json(details.into()))
}
