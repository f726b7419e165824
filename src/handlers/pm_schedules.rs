//! # PM Schedule API Handlers

use axum::{
    body::Bytes,
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
use crate::error::{ApiError, validation_error};
use crate::models::{pm_log, pm_schedule};
use crate::pm::{NewPmSchedule, PmScheduleUpdate, PmService};
use crate::repositories::PmScheduleFilter;
use crate::server::AppState;

/// Request payload for creating a PM schedule
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePmScheduleRequest {
    #[schema(example = "Grease bearings")]
    pub title: String,
    pub description: Option<String>,
    pub asset_id: Option<Uuid>,
    /// `daily`, `weekly`, `fortnightly`, `monthly`, `quarterly`, `6 monthly`,
    /// `yearly`, or a legacy unit (`days`, `weeks`, `months`, `years`).
    /// Defaults to `days`.
    #[schema(example = "weekly")]
    pub frequency_type: Option<String>,
    /// Multiplier for legacy units, at least 1 (default 1)
    pub frequency_interval: Option<i32>,
    /// First due date (RFC 3339), defaults to now
    #[schema(value_type = Option<String>, example = "2024-01-15T08:00:00Z")]
    pub next_due: Option<DateTime<Utc>>,
    pub assigned_to_user_id: Option<Uuid>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

/// Partial update payload for a PM schedule
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePmScheduleRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub asset_id: Option<Option<Uuid>>,
    pub frequency_type: Option<String>,
    pub frequency_interval: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub next_due: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to_user_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing PM schedules
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPmSchedulesQuery {
    /// Only schedules of this asset
    pub asset_id: Option<Uuid>,
    /// Only active (`true`) or inactive (`false`) schedules
    pub active: Option<bool>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Optional sign-off payload
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SignOffRequest {
    #[schema(example = "Replaced filter")]
    pub notes: Option<String>,
}

/// PM schedule representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PmScheduleResponse {
    pub id: String,
    pub asset_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "monthly")]
    pub frequency_type: String,
    pub frequency_interval: i32,
    pub last_performed: Option<String>,
    pub next_due: Option<String>,
    pub assigned_to_user_id: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<pm_schedule::Model> for PmScheduleResponse {
    fn from(model: pm_schedule::Model) -> Self {
        Self {
            id: model.id.to_string(),
            asset_id: model.asset_id.map(|id| id.to_string()),
            title: model.title,
            description: model.description,
            frequency_type: model.frequency_type,
            frequency_interval: model.frequency_interval,
            last_performed: model.last_performed.map(timestamp),
            next_due: model.next_due.map(timestamp),
            assigned_to_user_id: model.assigned_to_user_id.map(|id| id.to_string()),
            is_active: model.is_active,
            created_at: timestamp(model.created_at),
            updated_at: timestamp(model.updated_at),
        }
    }
}

/// Sign-off history entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PmLogResponse {
    pub id: String,
    pub pm_schedule_id: String,
    pub completed_at: String,
    pub completed_by_user_id: Option<String>,
    pub notes: Option<String>,
}

impl From<pm_log::Model> for PmLogResponse {
    fn from(model: pm_log::Model) -> Self {
        Self {
            id: model.id.to_string(),
            pm_schedule_id: model.pm_schedule_id.to_string(),
            completed_at: timestamp(model.completed_at),
            completed_by_user_id: model.completed_by_user_id.map(|id| id.to_string()),
            notes: model.notes,
        }
    }
}

/// Sign-off result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignOffResponse {
    pub schedule: PmScheduleResponse,
    pub log: PmLogResponse,
    #[schema(example = "2024-01-22T08:00:00Z")]
    pub next_due: String,
}

/// List PM schedules, soonest due first
#[utoipa::path(
    get,
    path = "/api/v1/pm-schedules",
    security(("bearer_auth" = [])),
    params(IdentityHeaders, ListPmSchedulesQuery),
    responses(
        (status = 200, description = "PM schedules of the tenant", body = ListResponse<PmScheduleResponse>),
        (status = 400, description = "Invalid filter or pagination", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn list_pm_schedules(
    State(state): State<AppState>,
    actor: ActorContext,
    query: Result<Query<ListPmSchedulesQuery>, QueryRejection>,
) -> Result<Json<ListResponse<PmScheduleResponse>>, ApiError> {
    let Query(query) = query?;
    let (skip, limit) = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .resolve(&state.config.listing)?;

    let filter = PmScheduleFilter {
        asset_id: query.asset_id,
        is_active: query.active,
        skip,
        limit,
    };
    let schedules = PmService::new(&state.db)
        .list(actor.tenant_id, &filter)
        .await?;

    Ok(Json(ListResponse::new(
        schedules.into_iter().map(PmScheduleResponse::from).collect(),
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/pm-schedules",
    security(("bearer_auth" = [])),
    params(IdentityHeaders),
    request_body = CreatePmScheduleRequest,
    responses(
        (status = 201, description = "PM schedule created", body = PmScheduleResponse),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn create_pm_schedule(
    State(state): State<AppState>,
    actor: ActorContext,
    payload: Result<Json<CreatePmScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PmScheduleResponse>), ApiError> {
    let Json(request) = payload?;

    let created = PmService::new(&state.db)
        .create(
            &actor,
            NewPmSchedule {
                title: request.title,
                description: request.description,
                asset_id: request.asset_id,
                frequency_type: request.frequency_type,
                frequency_interval: request.frequency_interval,
                next_due: request.next_due,
                assigned_to_user_id: request.assigned_to_user_id,
                is_active: request.is_active,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/pm-schedules/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "PM schedule id"), IdentityHeaders),
    responses(
        (status = 200, description = "PM schedule", body = PmScheduleResponse),
        (status = 404, description = "PM schedule not found", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn get_pm_schedule(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PmScheduleResponse>, ApiError> {
    let Path(id) = path?;
    let schedule = PmService::new(&state.db).get(actor.tenant_id, id).await?;
    Ok(Json(schedule.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/pm-schedules/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "PM schedule id"), IdentityHeaders),
    request_body = UpdatePmScheduleRequest,
    responses(
        (status = 200, description = "Updated PM schedule", body = PmScheduleResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "PM schedule not found", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn update_pm_schedule(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePmScheduleRequest>, JsonRejection>,
) -> Result<Json<PmScheduleResponse>, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;

    let changes = PmScheduleUpdate {
        title: request.title,
        description: request.description,
        asset_id: request.asset_id,
        frequency_type: request.frequency_type,
        frequency_interval: request.frequency_interval,
        next_due: request.next_due,
        assigned_to_user_id: request.assigned_to_user_id,
        is_active: request.is_active,
    };
    let updated = PmService::new(&state.db)
        .update(&actor, id, changes)
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a PM schedule and its sign-off history
#[utoipa::path(
    delete,
    path = "/api/v1/pm-schedules/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "PM schedule id"), IdentityHeaders),
    responses(
        (status = 204, description = "PM schedule deleted"),
        (status = 404, description = "PM schedule not found", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn delete_pm_schedule(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    PmService::new(&state.db).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sign off a PM schedule: log the work and advance `next_due`
///
/// The body is optional; an empty body signs off without notes.
#[utoipa::path(
    post,
    path = "/api/v1/pm-schedules/{id}/sign-off",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "PM schedule id"), IdentityHeaders),
    request_body(content = SignOffRequest, description = "Optional; may be empty", content_type = "application/json"),
    responses(
        (status = 200, description = "Schedule advanced", body = SignOffResponse),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 404, description = "PM schedule not found", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn sign_off_pm_schedule(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<Json<SignOffResponse>, ApiError> {
    let Path(id) = path?;
    let request = parse_optional_body(&body)?;

    let signed = PmService::new(&state.db)
        .sign_off(&actor, id, request.notes)
        .await?;

    Ok(Json(SignOffResponse {
        schedule: signed.schedule.into(),
        log: signed.log.into(),
        next_due: signed.next_due.to_rfc3339(),
    }))
}

/// Sign-off history of a schedule, newest first
#[utoipa::path(
    get,
    path = "/api/v1/pm-schedules/{id}/logs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "PM schedule id"), IdentityHeaders, Pagination),
    responses(
        (status = 200, description = "Sign-off log entries", body = ListResponse<PmLogResponse>),
        (status = 404, description = "PM schedule not found", body = ApiError)
    ),
    tag = "pm-schedules"
)]
pub async fn list_pm_logs(
    State(state): State<AppState>,
    actor: ActorContext,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<ListResponse<PmLogResponse>>, ApiError> {
    let Path(id) = path?;
    let Query(pagination) = query?;
    let (skip, limit) = pagination.resolve(&state.config.listing)?;

    let logs = PmService::new(&state.db)
        .list_logs(actor.tenant_id, id, skip, limit)
        .await?;

    Ok(Json(ListResponse::new(
        logs.into_iter().map(PmLogResponse::from).collect(),
        skip,
        limit,
    )))
}

fn parse_optional_body(body: &[u8]) -> Result<SignOffRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SignOffRequest::default());
    }

    serde_json::from_slice(body).map_err(|err| {
        validation_error(
            "Invalid request body",
            serde_json::json!({ "body": err.to_string() }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sign_off_body_means_no_notes() {
        assert_eq!(parse_optional_body(b"").unwrap().notes, None);
        assert_eq!(parse_optional_body(b"  \n").unwrap().notes, None);
        assert_eq!(
            parse_optional_body(br#"{"notes":"ok"}"#).unwrap().notes,
            Some("ok".to_string())
        );
        assert!(parse_optional_body(b"{not json").is_err());
    }
}
