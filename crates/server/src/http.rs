//! The HTTP façade: thin JSON routes over the orchestrator.

use crate::orchestrator::{ApiError, Orchestrator};
use crate::run::RunStatus;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/analysis", post(start_analysis))
        .route("/analysis/{run_id}/status", get(run_status))
        .route("/analysis/{run_id}/score-file", post(score_file))
        .route("/analysis/{run_id}/file-content", get(file_content))
        .with_state(orchestrator)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

#[derive(Deserialize)]
struct StartBody {
    #[serde(rename = "repoUrl")]
    repo_url: Option<String>,
    #[serde(rename = "runId")]
    run_id: Option<String>,
}

async fn start_analysis(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(body): Json<StartBody>,
) -> Result<Response, ApiError> {
    let repo_url = body
        .repo_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("repoUrl is required".to_string()))?;

    let started = orchestrator.start(&repo_url, body.run_id).await?;
    Ok((StatusCode::ACCEPTED, Json(started)).into_response())
}

async fn run_status(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(run_id): Path<String>,
) -> Result<Response, ApiError> {
    let run = orchestrator
        .run_handle(&run_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("run {run_id}")))?;

    let state = run.lock().await;
    let report = if state.status == RunStatus::Complete {
        state
            .final_scorecard
            .as_ref()
            .map(|card| serde_json::to_value(card).unwrap_or(serde_json::Value::Null))
            .unwrap_or(serde_json::Value::Null)
    } else {
        serde_json::Value::Null
    };
    let error = if state.status == RunStatus::Error {
        state.error.clone()
    } else {
        None
    };

    let payload = json!({
        "runId": state.run_id,
        "status": state.status,
        "logHistory": state.log_history,
        "report": report,
        "error": error,
    });
    Ok(Json(payload).into_response())
}

#[derive(Deserialize)]
struct ScoreFileBody {
    #[serde(rename = "filePath")]
    file_path: Option<String>,
}

async fn score_file(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(run_id): Path<String>,
    Json(body): Json<ScoreFileBody>,
) -> Result<Response, ApiError> {
    let file_path = body
        .file_path
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("filePath is required".to_string()))?;

    let scored = orchestrator.score_file(&run_id, &file_path).await?;
    Ok(Json(scored).into_response())
}

async fn file_content(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(run_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let file_path = params
        .get("filePath")
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("filePath query parameter is required".to_string()))?;

    let bytes = orchestrator.file_content(&run_id, file_path).await?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}
