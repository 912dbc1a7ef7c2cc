//! HTTP routes.
//!
//! Thin adapter between the wire and the services: each handler validates
//! the request shape, calls exactly one service, and translates the result
//! into JSON. All routes live under `/api`.

use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_CORS_ORIGIN;
use crate::error::ApiError;
use crate::services::assist::{self, FixOutcome};
use crate::services::compiler::CompileResponse;
use crate::services::fenced;
use crate::services::workspace::{display_path, FileNode};
use crate::AppState;

// ========== Wire Types ==========

#[derive(Debug, Deserialize)]
pub struct ReadFileParams {
    /// Workspace-relative file path
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadFileResponse {
    pub success: bool,
    pub content: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileRequest {
    /// Workspace-relative file path
    pub path: String,
    /// Content to write
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct WriteFileResponse {
    pub success: bool,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    /// C++ source text
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct FixRequest {
    /// C++ source text
    pub code: String,
    /// Compiler error to fix
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct FixResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub suggestions: String,
    #[serde(rename = "fixedCode", skip_serializing_if = "Option::is_none")]
    pub fixed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// C++ source text
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub suggestions: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugPathsResponse {
    pub project_root: String,
    pub current_dir: String,
    pub files: Vec<String>,
}

/// JSON body extractor that reports rejections as `400 {"error": …}`,
/// matching the rest of the API, instead of axum's plain-text default.
struct ApiJson<T>(T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

// ========== Router ==========

pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/files", get(list_files))
        .route("/api/file", get(read_file).post(write_file))
        .route("/api/compile", post(compile))
        .route("/api/fix", post(fix))
        .route("/api/review", post(review))
        .route("/api/debug/paths", get(debug_paths))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    match allowed_origin(origin) {
        Some(value) => cors.allow_origin(value),
        None => cors.allow_origin(Any),
    }
}

/// Allowed origin for the CORS layer; `None` means any origin (`*`).
/// A value that does not parse as a header falls back to the default
/// origin, never to any.
fn allowed_origin(origin: &str) -> Option<HeaderValue> {
    if origin == "*" {
        return None;
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                "invalid CORS_ORIGIN {:?}, using {}",
                origin,
                DEFAULT_CORS_ORIGIN
            );
            Some(HeaderValue::from_static(DEFAULT_CORS_ORIGIN))
        }
    }
}

// ===== Workspace =====

async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileNode>>, ApiError> {
    Ok(Json(state.workspace.tree().await?))
}

async fn read_file(
    State(state): State<AppState>,
    Query(params): Query<ReadFileParams>,
) -> Result<Json<ReadFileResponse>, ApiError> {
    let path = params
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No file path provided".into()))?;
    tracing::debug!(
        "reading {} under {}",
        path,
        state.workspace.root().display()
    );
    let content = state.workspace.read(&path).await?;
    Ok(Json(ReadFileResponse {
        success: true,
        content,
        path: display_path(&path),
    }))
}

async fn write_file(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WriteFileRequest>,
) -> Result<Json<WriteFileResponse>, ApiError> {
    if req.path.trim().is_empty() {
        return Err(ApiError::BadRequest("No file path provided".into()));
    }
    state.workspace.write(&req.path, &req.content).await?;
    Ok(Json(WriteFileResponse {
        success: true,
        path: display_path(&req.path),
    }))
}

// ===== Compile =====

async fn compile(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CompileRequest>,
) -> Result<Json<CompileResponse>, ApiError> {
    Ok(Json(state.compile.compile_and_run(&req.code).await?))
}

// ===== AI Assist =====

async fn fix(State(state): State<AppState>, ApiJson(req): ApiJson<FixRequest>) -> impl IntoResponse {
    match state.assist.fix(&req.code, &req.error).await {
        FixOutcome::Disabled => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(FixResponse {
                error: Some("AI service is not configured".into()),
                suggestions: assist::AI_DISABLED_HELP.into(),
                fixed_code: Some(req.code),
                explanation: None,
            }),
        ),
        FixOutcome::Upstream(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(FixResponse {
                error: Some(message),
                suggestions: assist::FIX_FALLBACK_SUGGESTIONS.into(),
                fixed_code: Some(req.code),
                explanation: None,
            }),
        ),
        FixOutcome::Reply(reply) => {
            let response = match fenced::extract_code_block(&reply) {
                Some(block) => FixResponse {
                    error: None,
                    suggestions: reply,
                    fixed_code: Some(block.code),
                    explanation: Some(block.prose),
                },
                None => FixResponse {
                    error: None,
                    suggestions: reply,
                    fixed_code: None,
                    explanation: None,
                },
            };
            (StatusCode::OK, Json(response))
        }
    }
}

async fn review(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Json<ReviewResponse> {
    Json(ReviewResponse {
        suggestions: state.assist.review(&req.code).await,
    })
}

// ===== Diagnostics =====

async fn debug_paths(State(state): State<AppState>) -> Result<Json<DebugPathsResponse>, ApiError> {
    let files = state.workspace.list_root().await?;
    Ok(Json(DebugPathsResponse {
        project_root: state.workspace.root().display().to_string(),
        current_dir: std::env::current_dir()?.display().to_string(),
        files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_response_uses_camel_case_key_and_omits_absent_fields() {
        let with_block = FixResponse {
            error: None,
            suggestions: "text".into(),
            fixed_code: Some("int main() {}".into()),
            explanation: Some("why".into()),
        };
        let value = serde_json::to_value(&with_block).unwrap();
        assert_eq!(value["fixedCode"], "int main() {}");
        assert!(value.get("fixed_code").is_none());
        assert!(value.get("error").is_none());

        let bare = FixResponse {
            error: None,
            suggestions: "text".into(),
            fixed_code: None,
            explanation: None,
        };
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("fixedCode").is_none());
        assert!(value.get("explanation").is_none());
    }

    #[test]
    fn test_debug_paths_response_is_camel_case() {
        let value = serde_json::to_value(DebugPathsResponse {
            project_root: "/ws".into(),
            current_dir: "/srv".into(),
            files: vec!["a.txt".into()],
        })
        .unwrap();
        assert_eq!(value["projectRoot"], "/ws");
        assert_eq!(value["currentDir"], "/srv");
    }

    #[tokio::test]
    async fn test_rejected_json_body_maps_to_bad_request() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/compile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{}"))
            .unwrap();

        let err = match ApiJson::<CompileRequest>::from_request(req, &()).await {
            Ok(_) => panic!("a body without `code` must be rejected"),
            Err(err) => err,
        };
        match err {
            ApiError::BadRequest(msg) => assert!(msg.contains("missing field")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_wildcard_cors_origin_allows_any() {
        assert!(allowed_origin("*").is_none());
    }

    #[test]
    fn test_invalid_cors_origin_falls_back_to_default() {
        assert_eq!(
            allowed_origin("not\nan\norigin").unwrap(),
            DEFAULT_CORS_ORIGIN
        );
        assert_eq!(
            allowed_origin("http://localhost:4000").unwrap(),
            "http://localhost:4000"
        );
    }
}
