//! # API Routes

pub mod facade;
pub mod orchestrator;

use axum::{
    routing::{get, post},
    Json, Router,
};
use compass_core::facade::{Kpis, RunInput, RunTrace, Stage, StageRecord};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::SharedState;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Compass API",
        version = "1.0.0",
        description = "Facade runs and orchestrator probes for the COMPASS-DRIVE demo"
    ),
    paths(facade::run_facade),
    components(schemas(RunInput, RunTrace, StageRecord, Stage, Kpis, ApiResponse)),
    tags(
        (name = "facade", description = "Synthetic CYCLE-F pipeline runs")
    )
)]
pub struct ApiDoc;

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router(state: SharedState) -> Router {
    let orchestrator_routes = Router::new()
        .route("/snapshot", get(orchestrator::snapshot))
        .route("/preflight", get(orchestrator::preflight))
        .route("/invoke", post(orchestrator::invoke));

    Router::new()
        .route("/api/facade/run", post(facade::run_facade))
        .nest("/api/v1/orchestrator", orchestrator_routes)
        .route("/api/v1/openapi.json", get(serve_openapi))
        .with_state(state)
}
