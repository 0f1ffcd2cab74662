use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use code_exec::{
    CodeExecutionService, ErrorKind, ExecConfig, ExecutionOutcome, ExecutionRequest,
    RuntimeReadiness,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Execution error: {0}")]
    ExecutionError(#[from] code_exec::Error),
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::ExecutionError(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::ServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExecuteRequest {
    pub language: String,
    pub code: String,
}

/// One run, as the display surface receives it
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub output: String,
    pub status: String,
    pub kind: Option<ErrorKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub readiness: RuntimeReadiness,
    pub loading_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub strategy: String,
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<CodeExecutionService>,
}

pub async fn create_app(config: ExecConfig) -> Result<Router, ServerError> {
    let service = CodeExecutionService::new(config)
        .await
        .map_err(ServerError::ExecutionError)?;
    Ok(router(service))
}

/// Routes over an existing session
pub fn router(service: CodeExecutionService) -> Router {
    let state = AppState {
        service: Arc::new(service),
    };

    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/languages", get(languages))
        .route("/execute", post(execute))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    info!("Starting code execution server on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::ServerError(e.to_string()))?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        readiness: state.service.readiness(),
        loading_message: state.service.loading_message(),
    })
}

async fn languages(State(state): State<AppState>) -> Json<Vec<LanguageEntry>> {
    Json(
        state
            .service
            .languages()
            .iter()
            .map(|(language, strategy)| LanguageEntry {
                language: language.to_string(),
                strategy: format!("{:?}", strategy).to_lowercase(),
            })
            .collect(),
    )
}

async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ServerError> {
    if payload.language.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "language must not be empty".to_string(),
        ));
    }

    let outcome = state
        .service
        .execute(ExecutionRequest::new(payload.language, payload.code))
        .await;

    let kind = match &outcome {
        ExecutionOutcome::Error { kind, .. } => Some(*kind),
        ExecutionOutcome::Success { .. } => None,
    };

    Ok(Json(ExecuteResponse {
        output: state.service.formatter().format(&outcome),
        status: outcome.status().to_string(),
        kind,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn app() -> Router {
        create_app(ExecConfig::default().with_python_command("definitely-not-python".into()))
            .await
            .expect("Failed to create app")
    }

    async fn post_execute(app: Router, request: &ExecuteRequest) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/execute")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_execute_javascript() {
        let request = ExecuteRequest {
            language: "javascript".to_string(),
            code: r#"console.log("Hello, World!")"#.to_string(),
        };

        let (status, body) = post_execute(app().await, &request).await;
        assert_eq!(status, StatusCode::OK);

        let result: ExecuteResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.output, "Hello, World!");
        assert_eq!(result.status, "success");
        assert!(result.kind.is_none());
    }

    #[tokio::test]
    async fn test_execute_unsupported_language() {
        let request = ExecuteRequest {
            language: "ruby".to_string(),
            code: "puts 1".to_string(),
        };

        let (status, body) = post_execute(app().await, &request).await;
        assert_eq!(status, StatusCode::OK);

        let result: ExecuteResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.output, "Language not supported for browser execution.");
        assert_eq!(result.status, "error");
        assert_eq!(result.kind, Some(ErrorKind::UnsupportedLanguage));
    }

    #[tokio::test]
    async fn test_execute_rejects_empty_language() {
        let request = ExecuteRequest {
            language: " ".to_string(),
            code: "1".to_string(),
        };

        let (status, _) = post_execute(app().await, &request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_reports_loading_slot() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: StatusResponse = serde_json::from_slice(&body).unwrap();
        match status.readiness {
            RuntimeReadiness::Failed(_) => {
                assert_eq!(status.loading_message, "Error loading Python runtime.")
            }
            _ => assert_eq!(status.loading_message, "IDE is loading..."),
        }
    }

    #[tokio::test]
    async fn test_languages() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/languages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entries: Vec<LanguageEntry> = serde_json::from_slice(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].language, "javascript");
        assert_eq!(entries[0].strategy, "native");
        assert_eq!(entries[1].language, "python");
        assert_eq!(entries[1].strategy, "hosted");
    }
}
