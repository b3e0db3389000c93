//! # Facade API
//!
//! The synthetic pipeline run behind the "Run demo" button.

use axum::{body::Bytes, extract::State, Json};
use compass_core::facade::{RunInput, RunTrace};

use crate::SharedState;

/// Generate a facade run
///
/// Malformed or missing bodies fall back to the default task and KPI.
#[utoipa::path(
    post,
    path = "/api/facade/run",
    tag = "facade",
    request_body = RunInput,
    responses(
        (status = 200, description = "Six-stage synthetic trace", body = RunTrace)
    )
)]
pub async fn run_facade(State(state): State<SharedState>, body: Bytes) -> Json<RunTrace> {
    let input = RunInput::from_slice(&body);
    Json(state.generator.run_input(&input).await)
}
