//! # Server Configuration
//!
//! Router assembly, OpenAPI document and the serve loop of the maintenance API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{self, assets, pm_schedules, work_orders};
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/work-orders",
            get(work_orders::list_work_orders).post(work_orders::create_work_order),
        )
        .route("/work-orders/stats", get(work_orders::work_order_stats))
        .route(
            "/work-orders/{id}",
            get(work_orders::get_work_order)
                .put(work_orders::update_work_order)
                .delete(work_orders::delete_work_order),
        )
        .route("/work-orders/{id}/join", post(work_orders::join_work_order))
        .route("/work-orders/{id}/leave", post(work_orders::leave_work_order))
        .route(
            "/assets",
            get(assets::list_assets).post(assets::create_asset),
        )
        .route(
            "/assets/{id}",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/assets/{id}/sync-status", post(assets::sync_asset_status))
        .route(
            "/pm-schedules",
            get(pm_schedules::list_pm_schedules).post(pm_schedules::create_pm_schedule),
        )
        .route(
            "/pm-schedules/{id}",
            get(pm_schedules::get_pm_schedule)
                .put(pm_schedules::update_pm_schedule)
                .delete(pm_schedules::delete_pm_schedule),
        )
        .route(
            "/pm-schedules/{id}/sign-off",
            post(pm_schedules::sign_off_pm_schedule),
        )
        .route("/pm-schedules/{id}/logs", get(pm_schedules::list_pm_logs))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server and serves until Ctrl-C
pub async fn run_server(config: Arc<AppConfig>, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("Invalid server address")?;
    let state = AppState {
        config: config.clone(),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::work_orders::list_work_orders,
        crate::handlers::work_orders::create_work_order,
        crate::handlers::work_orders::work_order_stats,
        crate::handlers::work_orders::get_work_order,
        crate::handlers::work_orders::update_work_order,
        crate::handlers::work_orders::delete_work_order,
        crate::handlers::work_orders::join_work_order,
        crate::handlers::work_orders::leave_work_order,
        crate::handlers::assets::list_assets,
        crate::handlers::assets::create_asset,
        crate::handlers::assets::get_asset,
        crate::handlers::assets::update_asset,
        crate::handlers::assets::delete_asset,
        crate::handlers::assets::sync_asset_status,
        crate::handlers::pm_schedules::list_pm_schedules,
        crate::handlers::pm_schedules::create_pm_schedule,
        crate::handlers::pm_schedules::get_pm_schedule,
        crate::handlers::pm_schedules::update_pm_schedule,
        crate::handlers::pm_schedules::delete_pm_schedule,
        crate::handlers::pm_schedules::sign_off_pm_schedule,
        crate::handlers::pm_schedules::list_pm_logs,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::WorkOrderStatus,
            crate::models::Priority,
            crate::models::AssetStatus,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::work_orders::CreateWorkOrderRequest,
            crate::handlers::work_orders::UpdateWorkOrderRequest,
            crate::handlers::work_orders::WorkOrderResponse,
            crate::handlers::work_orders::ActiveSessionResponse,
            crate::work_orders::WorkOrderStats,
            crate::handlers::assets::CreateAssetRequest,
            crate::handlers::assets::UpdateAssetRequest,
            crate::handlers::assets::AssetResponse,
            crate::handlers::assets::SyncStatusResponse,
            crate::handlers::pm_schedules::CreatePmScheduleRequest,
            crate::handlers::pm_schedules::UpdatePmScheduleRequest,
            crate::handlers::pm_schedules::PmScheduleResponse,
            crate::handlers::pm_schedules::PmLogResponse,
            crate::handlers::pm_schedules::SignOffRequest,
            crate::handlers::pm_schedules::SignOffResponse,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "work-orders", description = "Work order lifecycle, presence and dashboard counters"),
        (name = "assets", description = "Assets and their derived health status"),
        (name = "pm-schedules", description = "Preventive-maintenance schedules and sign-off"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Maintenance API",
        description = "Multi-tenant maintenance management: work orders, asset health and preventive maintenance",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/",
            "/health",
            "/api/v1/work-orders",
            "/api/v1/work-orders/stats",
            "/api/v1/work-orders/{id}",
            "/api/v1/work-orders/{id}/join",
            "/api/v1/work-orders/{id}/leave",
            "/api/v1/assets",
            "/api/v1/assets/{id}",
            "/api/v1/assets/{id}/sync-status",
            "/api/v1/pm-schedules",
            "/api/v1/pm-schedules/{id}",
            "/api/v1/pm-schedules/{id}/sign-off",
            "/api/v1/pm-schedules/{id}/logs",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
