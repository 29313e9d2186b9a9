//! HTTP API over the estimator and the question pipeline.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::AnalysisPipeline;
use crate::db::Db;
use crate::error::Result;

pub struct AppState {
    pub db: Db,
    /// Absent when no LLM API key is configured; `/ask` then returns 503.
    pub pipeline: Option<AnalysisPipeline>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/elasticity/product", get(routes::product_elasticity))
        .route("/elasticity/customer", get(routes::customer_elasticity))
        .route(
            "/elasticity/customer-product",
            get(routes::customer_product_elasticity),
        )
        .route("/ask", post(routes::ask))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(Arc::new(state));

    info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
