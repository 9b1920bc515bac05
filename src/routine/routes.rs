//! REST endpoints for routine generation.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::info;

use crate::server::error_response;

use super::generator::{RoutineGenerator, RoutineSource};
use super::model::RoutineRequest;
use super::orchestrator::RoutineOrchestrator;

/// Shared state for routine routes.
#[derive(Clone)]
pub struct RoutineRouteState {
    pub generator: Arc<RoutineGenerator>,
    pub orchestrator: Arc<RoutineOrchestrator>,
}

/// POST /api/routine
///
/// Stateless generation from a profile-shaped body. Nothing is stored.
async fn generate_routine(
    State(state): State<RoutineRouteState>,
    Json(body): Json<Value>,
) -> Response {
    let request = RoutineRequest::from_json(&body);
    info!(
        goals = ?request.fitness_goals,
        level = %request.activity_level,
        "Routine requested"
    );

    match state.generator.generate(&request).await {
        Ok(outcome) if outcome.source == RoutineSource::Development => Json(json!({
            "routine": outcome.routine,
            "source": outcome.source,
        }))
        .into_response(),
        Ok(outcome) => Json(json!({ "routine": outcome.routine })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/users/{user_id}/routine
async fn get_or_generate(
    State(state): State<RoutineRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.orchestrator.get_or_generate(&user_id).await {
        Ok(result) => Json(json!({ "routine": result.routine })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/users/{user_id}/routine/regenerate
async fn regenerate(
    State(state): State<RoutineRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.orchestrator.regenerate(&user_id).await {
        Ok(result) => Json(json!({ "routine": result.routine })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/users/{user_id}/routine
async fn current_routine(
    State(state): State<RoutineRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.orchestrator.current_routine(&user_id).await {
        Ok(Some(routine)) => Json(json!({ "routine": routine })).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No routine stored for this user"),
        Err(e) => e.into_response(),
    }
}

/// Build the routine REST routes.
pub fn routine_routes(state: RoutineRouteState) -> Router {
    Router::new()
        .route("/api/routine", post(generate_routine))
        .route(
            "/api/users/{user_id}/routine",
            post(get_or_generate).get(current_routine),
        )
        .route("/api/users/{user_id}/routine/regenerate", post(regenerate))
        .with_state(state)
}
