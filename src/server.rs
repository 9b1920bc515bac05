//! HTTP surface: service wiring, error mapping, health check and CORS.

use std::sync::Arc;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use crate::chat::{ChatRouteState, CoachChat, chat_routes};
use crate::config::AppConfig;
use crate::error::{ChatError, RoutineError};
use crate::llm::LlmProvider;
use crate::profile::{ProfileRouteState, profile_routes};
use crate::routine::{RoutineGenerator, RoutineOrchestrator, RoutineRouteState, routine_routes};
use crate::store::Database;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "fit-coach";

/// Long-lived services shared by every request.
#[derive(Clone)]
pub struct AppServices {
    pub db: Arc<dyn Database>,
    pub generator: Arc<RoutineGenerator>,
    pub orchestrator: Arc<RoutineOrchestrator>,
    pub coach: Arc<CoachChat>,
}

impl AppServices {
    /// Wire services from configuration. `llm` is `None` without an API key.
    pub fn new(
        config: &AppConfig,
        db: Arc<dyn Database>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let generator = Arc::new(RoutineGenerator::new(
            llm.clone(),
            config.development_mode,
            config.retry.clone(),
        ));
        let orchestrator = Arc::new(RoutineOrchestrator::new(
            Arc::clone(&db),
            Arc::clone(&generator),
        ));
        let coach = Arc::new(CoachChat::new(llm, config.retry.clone()));
        Self {
            db,
            generator,
            orchestrator,
            coach,
        }
    }
}

/// JSON error body: `{"error": message}`.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl RoutineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProfileNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ProfileIncomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidProfile(_) => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::Upstream(_)
            | Self::Normalization(_)
            | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RoutineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Routine request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Routine request rejected");
        }
        error_response(status, self.to_string())
    }
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyMessage => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Chat request failed");
        }
        error_response(status, self.to_string())
    }
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// CORS from a comma-separated origin list. Empty or `*` allows any origin.
pub fn cors_layer(origins: &str) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let allow_origin = if parsed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the full application router.
pub fn build_router(services: &AppServices, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routine_routes(RoutineRouteState {
            generator: Arc::clone(&services.generator),
            orchestrator: Arc::clone(&services.orchestrator),
        }))
        .merge(profile_routes(ProfileRouteState {
            db: Arc::clone(&services.db),
        }))
        .merge(chat_routes(ChatRouteState {
            coach: Arc::clone(&services.coach),
        }))
        .layer(cors)
}

/// Serve `router` on an already-bound listener until the process stops.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::error::ConfigError;
    use crate::store::LibSqlBackend;

    async fn app(config: AppConfig) -> Router {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let services = AppServices::new(&config, db, None);
        build_router(&services, cors_layer(&config.cors_origins))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(AppConfig::default()).await, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn stateless_routine_without_key_is_config_error() {
        let request = json_request("POST", "/api/routine", json!({"fitness_goals": ["lose_weight"]}));
        let (status, body) = send(app(AppConfig::default()).await, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn stateless_routine_in_development_mode() {
        let config = AppConfig {
            development_mode: true,
            ..AppConfig::default()
        };
        let request = json_request(
            "POST",
            "/api/routine",
            json!({"fitness_goals": ["lose_weight"], "activity_level": "active", "gender": "female"}),
        );
        let (status, body) = send(app(config).await, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "development");
        assert_eq!(body["routine"]["weeklyPlan"][0]["focus"], "Full Body HIIT");
        assert_eq!(body["routine"]["weeklyPlan"][1]["focus"], "Cardio y Core");
    }

    #[tokio::test]
    async fn profile_flow_and_onboarding_status() {
        let app = app(AppConfig::default()).await;

        let request = Request::get("/api/users/u1/onboarding").body(Body::empty()).unwrap();
        let (_, body) = send(app.clone(), request).await;
        assert_eq!(body["next"], "/onboarding");

        let request = Request::get("/api/users/u1/profile").body(Body::empty()).unwrap();
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = json_request(
            "PUT",
            "/api/users/u1/profile",
            json!({"weight": 20.0, "fitness_goals": ["gain_muscle"]}),
        );
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("weight"));

        let request = json_request(
            "PUT",
            "/api/users/u1/profile",
            json!({"weight": 70.0, "height": 175.0, "fitness_goals": ["gain_muscle"], "activity_level": "moderate"}),
        );
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fitness_goals"][0], "gain_muscle");
        assert_eq!(body["has_completed_onboarding"], true);

        let request = Request::get("/api/users/u1/onboarding").body(Body::empty()).unwrap();
        let (_, body) = send(app, request).await;
        assert_eq!(body["next"], "/dashboard");
    }

    #[tokio::test]
    async fn chat_rejects_empty_message() {
        let request = json_request("POST", "/api/fitness-chat", json!({"message": "  "}));
        let (status, _) = send(app(AppConfig::default()).await, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn routine_error_statuses() {
        let cases = [
            (
                RoutineError::ProfileNotFound { user_id: "u".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                RoutineError::ProfileIncomplete {
                    user_id: "u".into(),
                    missing: "activity_level".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RoutineError::InvalidProfile("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RoutineError::Config(ConfigError::missing_api_key()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }
}
