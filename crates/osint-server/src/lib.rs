//! Dashboard API over the workflow orchestrator and the audit log.

pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::stats::health))
        .route("/api/stats", get(routes::stats::get_stats))
        // Workflows
        .route(
            "/api/workflows",
            get(routes::workflows::list_workflows).post(routes::workflows::create_workflow),
        )
        .route("/api/workflows/{id}", get(routes::workflows::get_workflow))
        .route(
            "/api/workflows/{id}/execute",
            post(routes::workflows::execute_workflow),
        )
        .route(
            "/api/workflows/{id}/schedule",
            post(routes::workflows::schedule_workflow),
        )
        .route(
            "/api/workflows/{id}/monitor",
            post(routes::workflows::monitor_workflow),
        )
        .route(
            "/api/workflows/{id}/pause",
            post(routes::workflows::pause_workflow),
        )
        .route(
            "/api/workflows/{id}/resume",
            post(routes::workflows::resume_workflow),
        )
        // Alerts
        .route("/api/alerts", get(routes::alerts::list_alerts))
        .route(
            "/api/alerts/{id}/acknowledge",
            post(routes::alerts::acknowledge_alert),
        )
        // Campaigns
        .route("/api/campaigns", post(routes::campaigns::run_campaign))
        // Audit
        .route(
            "/api/investigations/{id}/audit",
            get(routes::audit::get_audit_trail),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the dashboard API on `0.0.0.0:port` until Ctrl-C, then stop every
/// background workflow loop.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(app_state, listener).await
}

/// Like [`serve`], on a pre-bound listener (port 0 lets the OS pick).
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let orchestrator = app_state.orchestrator.clone();
    let app = build_router(app_state);

    tracing::info!("OSINT dashboard API listening on http://localhost:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    orchestrator.shutdown().await;
    Ok(())
}
