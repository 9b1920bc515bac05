//! REST endpoint for the coach chat.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use super::coach::{ChatTurn, CoachChat};

/// Shared state for chat routes.
#[derive(Clone)]
pub struct ChatRouteState {
    pub coach: Arc<CoachChat>,
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    routine: Value,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

/// POST /api/fitness-chat
async fn fitness_chat(State(state): State<ChatRouteState>, Json(body): Json<ChatBody>) -> Response {
    match state
        .coach
        .reply(&body.message, &body.routine, &body.history)
        .await
    {
        Ok(message) => Json(json!({ "message": message })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Build the chat REST routes.
pub fn chat_routes(state: ChatRouteState) -> Router {
    Router::new()
        .route("/api/fitness-chat", post(fitness_chat))
        .with_state(state)
}
