//! # Authentication and Identity
//!
//! Requests reach `/api/v1` through a gateway holding an operator bearer
//! token. The gateway forwards the tenant and user it authenticated in
//! `X-Tenant-Id` / `X-User-Id`; this module verifies the token, loads the
//! user inside that tenant and hands an explicit [`ActorContext`] to the
//! handlers.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, forbidden, unauthorized, validation_error};
use crate::models::Role;
use crate::repositories::UserRepository;
use crate::server::AppState;

pub const TENANT_HEADER: &str = "X-Tenant-Id";
pub const USER_HEADER: &str = "X-User-Id";

/// The acting identity threaded into every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

/// Authentication middleware: bearer token, identity headers, user lookup.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let token = extract_bearer_token(headers)?;
    validate_token(&state.config, token)?;

    let tenant_id = extract_uuid_header(headers, TENANT_HEADER)?;
    let user_id = extract_uuid_header(headers, USER_HEADER)?;

    let actor = resolve_actor(&state.db, tenant_id, user_id).await?;
    tracing::debug!(
        tenant_id = %actor.tenant_id,
        user_id = %actor.user_id,
        role = %actor.role,
        "Authenticated request"
    );

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Load the user inside the tenant and turn it into an [`ActorContext`].
///
/// An unknown user and a user of another tenant are indistinguishable.
pub async fn resolve_actor<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    user_id: Uuid,
) -> Result<ActorContext, ApiError> {
    let user = UserRepository::new(conn)
        .find_in_tenant(tenant_id, user_id)
        .await?
        .ok_or_else(|| forbidden(Some("User does not belong to this tenant")))?;

    if !user.is_active {
        return Err(forbidden(Some("Inactive user")));
    }

    let role = user.role.parse::<Role>().map_err(|err| {
        tracing::warn!(user_id = %user.id, error = %err, "Stored user role is not recognised");
        forbidden(Some("User role is not recognised"))
    })?;

    Ok(ActorContext {
        tenant_id,
        user_id,
        role,
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_uuid_header(headers: &HeaderMap, name: &'static str) -> Result<Uuid, ApiError> {
    let header_value = headers
        .get(name)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ name: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid identity header",
                serde_json::json!({ name: "Header must be valid UTF-8" }),
            )
        })?;

    header_value.trim().parse::<Uuid>().map_err(|_| {
        validation_error(
            "Invalid identity header",
            serde_json::json!({ name: "Must be a valid UUID" }),
        )
    })
}

/// OpenAPI header parameters identifying the acting tenant and user
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Header)]
pub struct IdentityHeaders {
    /// Tenant identifier (UUID) that scopes the request
    #[serde(rename = "X-Tenant-Id")]
    #[param(rename = "X-Tenant-Id", value_type = String)]
    pub tenant_id: String,
    /// Acting user identifier (UUID), must belong to the tenant
    #[serde(rename = "X-User-Id")]
    #[param(rename = "X-User-Id", value_type = String)]
    pub user_id: String,
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Authenticated identity required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        TenantRepository,
        tenant::NewTenant,
        user::{NewUser, UserRepository},
    };
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token-123";

    struct Fixture {
        state: AppState,
        tenant_id: Uuid,
        active_user: Uuid,
        inactive_user: Uuid,
    }

    async fn fixture() -> Fixture {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let tenant = TenantRepository::new(&db)
            .create(NewTenant {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                primary_domain: None,
                plan: None,
            })
            .await
            .unwrap();

        let users = UserRepository::new(&db);
        let active = users
            .create(
                tenant.id,
                NewUser {
                    email: "tech@acme.test".to_string(),
                    full_name: None,
                    role: Role::Technician,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        let inactive = users
            .create(
                tenant.id,
                NewUser {
                    email: "gone@acme.test".to_string(),
                    full_name: None,
                    role: Role::Admin,
                    is_active: false,
                },
            )
            .await
            .unwrap();

        let config = Arc::new(AppConfig {
            operator_tokens: vec![TOKEN.to_string(), "second-token".to_string()],
            ..Default::default()
        });

        Fixture {
            state: AppState { config, db },
            tenant_id: tenant.id,
            active_user: active.id,
            inactive_user: inactive.id,
        }
    }

    async fn run_middleware(state: AppState, request: Request<Body>) -> Response {
        async fn handler(actor: ActorContext) -> String {
            actor.role.to_string()
        }

        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap()
    }

    fn request(token: Option<&str>, tenant: Option<String>, user: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test");
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        if let Some(tenant) = tenant {
            builder = builder.header(TENANT_HEADER, tenant);
        }
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let f = fixture().await;
        let req = request(
            None,
            Some(f.tenant_id.to_string()),
            Some(f.active_user.to_string()),
        );
        let response = run_middleware(f.state, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let f = fixture().await;
        let req = request(
            Some("Basic dGVzdDoxMjM="),
            Some(f.tenant_id.to_string()),
            Some(f.active_user.to_string()),
        );
        let response = run_middleware(f.state, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_returns_401() {
        let f = fixture().await;
        let req = request(
            Some("Bearer wrong-token"),
            Some(f.tenant_id.to_string()),
            Some(f.active_user.to_string()),
        );
        let response = run_middleware(f.state, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_or_malformed_identity_headers_return_400() {
        let f = fixture().await;
        let bearer = format!("Bearer {TOKEN}");

        let req = request(Some(&bearer), None, Some(f.active_user.to_string()));
        let response = run_middleware(f.state.clone(), req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = request(Some(&bearer), Some(f.tenant_id.to_string()), None);
        let response = run_middleware(f.state.clone(), req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = request(
            Some(&bearer),
            Some("not-a-uuid".to_string()),
            Some(f.active_user.to_string()),
        );
        let response = run_middleware(f.state, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn user_from_other_tenant_returns_403() {
        let f = fixture().await;
        let req = request(
            Some(&format!("Bearer {TOKEN}")),
            Some(Uuid::new_v4().to_string()),
            Some(f.active_user.to_string()),
        );
        let response = run_middleware(f.state, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn inactive_user_returns_403() {
        let f = fixture().await;
        let req = request(
            Some(&format!("Bearer {TOKEN}")),
            Some(f.tenant_id.to_string()),
            Some(f.inactive_user.to_string()),
        );
        let response = run_middleware(f.state, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Inactive user");
    }

    #[tokio::test]
    async fn valid_request_exposes_actor() {
        let f = fixture().await;
        for token in [TOKEN, "second-token"] {
            let req = request(
                Some(&format!("Bearer {token}")),
                Some(f.tenant_id.to_string()),
                Some(f.active_user.to_string()),
            );
            let response = run_middleware(f.state.clone(), req).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&body[..], b"technician");
        }
    }
}
