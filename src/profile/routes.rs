//! REST endpoints for onboarding answers and status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::error::{DatabaseError, RoutineError};
use crate::server::error_response;
use crate::store::Database;

use super::model::{OnboardingStatus, ProfileUpdate, UserProfile};

/// Shared state for profile routes.
#[derive(Clone)]
pub struct ProfileRouteState {
    pub db: Arc<dyn Database>,
}

/// GET /api/users/{user_id}/profile
///
/// Returns the stored profile, or 404 if onboarding never saved one.
async fn get_profile(
    State(state): State<ProfileRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.db.get_profile(&user_id).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No profile exists yet"),
        Err(e) => RoutineError::from(e).into_response(),
    }
}

/// PUT /api/users/{user_id}/profile
///
/// Saves the onboarding answers, merging into any existing profile.
async fn put_profile(
    State(state): State<ProfileRouteState>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    if let Err(reason) = update.validate() {
        return RoutineError::InvalidProfile(reason).into_response();
    }

    match save_profile(state.db.as_ref(), &user_id, update).await {
        Ok(Some(profile)) => {
            info!(
                user_id = %user_id,
                completed = profile.has_completed_onboarding,
                "Profile saved"
            );
            Json(profile).into_response()
        }
        Ok(None) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Profile was not saved"),
        Err(e) => RoutineError::from(e).into_response(),
    }
}

async fn save_profile(
    db: &dyn Database,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<Option<UserProfile>, DatabaseError> {
    let existing = db.get_profile(user_id).await?;
    let profile = update.apply(user_id, existing);
    db.upsert_profile(&profile).await?;
    db.get_profile(user_id).await
}

/// GET /api/users/{user_id}/onboarding
///
/// Tells the client whether to route the user to onboarding or the dashboard.
async fn get_onboarding(
    State(state): State<ProfileRouteState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.db.get_profile(&user_id).await {
        Ok(profile) => Json(OnboardingStatus::for_profile(profile.as_ref())).into_response(),
        Err(e) => RoutineError::from(e).into_response(),
    }
}

/// Build the profile REST routes.
pub fn profile_routes(state: ProfileRouteState) -> Router {
    Router::new()
        .route(
            "/api/users/{user_id}/profile",
            get(get_profile).put(put_profile),
        )
        .route("/api/users/{user_id}/onboarding", get(get_onboarding))
        .with_state(state)
}
