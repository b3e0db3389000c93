//! # Orchestrator API
//!
//! Server-side renditions of the live panels: probe the orchestrator and
//! report what came back, failures included.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use compass_core::health::InvokeBadge;
use compass_core::orchestrator::{
    InvokeRequest, OrchestratorSnapshot, PreflightReport, CLOCK_SERVER, CLOCK_TOOL,
};
use compass_core::probe::ProbeResult;
use serde::Serialize;

use super::ApiResponse;
use crate::SharedState;

/// Invoke outcome with its badge
#[derive(Serialize)]
pub struct InvokeResponse {
    pub badge: InvokeBadge,
    pub label: String,
    pub result: ProbeResult,
}

/// GET /api/v1/orchestrator/snapshot
pub async fn snapshot(State(state): State<SharedState>) -> Json<OrchestratorSnapshot> {
    Json(
        state
            .orchestrator
            .snapshot(&state.config.expected_servers)
            .await,
    )
}

/// GET /api/v1/orchestrator/preflight
pub async fn preflight(State(state): State<SharedState>) -> Json<PreflightReport> {
    Json(state.orchestrator.preflight().await)
}

/// POST /api/v1/orchestrator/invoke
///
/// An empty body invokes the reference clock tool.
pub async fn invoke(State(state): State<SharedState>, body: Bytes) -> impl IntoResponse {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        InvokeRequest::new(CLOCK_SERVER, CLOCK_TOOL)
    } else {
        match serde_json::from_slice::<InvokeRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse {
                        success: false,
                        message: format!("Invalid invoke request: {}", e),
                    }),
                )
                    .into_response();
            }
        }
    };

    let result = state.orchestrator.invoke(&request).await;
    let badge = InvokeBadge::from_result(Some(&result));
    Json(InvokeResponse {
        badge,
        label: badge.to_string(),
        result,
    })
    .into_response()
}
