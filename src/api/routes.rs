//! Router construction and server startup.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{budget_plan, dashboard};
use crate::budget::PlanStorage;
use crate::catalog::{Catalog, SqliteCatalog};
use crate::config::Config;
use crate::db::Db;

/// Shared state for all handlers.
pub struct AppState {
    pub plans: Arc<PlanStorage>,
    pub catalog: Arc<dyn Catalog>,
}

impl AppState {
    /// Plan store and catalog over the configured database.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let db = Db::open(&config.database_path)?;
        Ok(Self {
            plans: Arc::new(PlanStorage::with_fallback(db.clone(), &config.data_dir)),
            catalog: Arc::new(SqliteCatalog::new(db)),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/admin/demo", get(dashboard::index))
        .route("/admin/demo/report", get(dashboard::report))
        .route("/admin/demo/budget-plan/:project", get(budget_plan::get_plan))
        .route(
            "/admin/demo/budget-plan/:project/status",
            post(budget_plan::set_status),
        )
        .route(
            "/admin/demo/budget-plan/:project/actual-costs",
            get(budget_plan::actual_costs),
        )
        .route("/admin/demo/:code", get(dashboard::error_page))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Start the HTTP server and block until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let state = Arc::new(AppState::open(&config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        database = %config.database_path.display(),
        data_dir = %config.data_dir.display(),
        "budget planner listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
