use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::detection::CandidateTiers;
use crate::routes::AppState;

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn handle_health_request() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn handle_languages_request(State(state): State<AppState>) -> Json<CandidateTiers> {
    Json(state.orchestrator.tiers().clone())
}
