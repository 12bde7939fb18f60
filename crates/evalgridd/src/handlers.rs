//! Request handlers for the benchmark API.
//!
//! Request bodies are taken as raw JSON and decoded by hand so rejections
//! carry the serde message instead of an opaque 400. Malformed job ids are
//! indistinguishable from unknown ones and map to 404.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use evalgrid_core::{analyze, RunHistory, RunRequest, ANALYSIS_WINDOW};
use evalgrid_orchestrator::{JobId, JobScheduler, SchedulerError};

/// Shared state behind every handler.
pub struct ApiState {
    pub scheduler: Arc<JobScheduler>,
    pub history: Arc<dyn RunHistory>,
}

type ApiError = (StatusCode, Json<Value>);

fn scheduler_error(e: SchedulerError) -> ApiError {
    match e {
        SchedulerError::Validation(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
        }
        SchedulerError::NameConflict { ref conflicts } => (
            StatusCode::CONFLICT,
            Json(json!({ "error": e.to_string(), "conflicts": conflicts })),
        ),
        SchedulerError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "job not found" })),
        ),
        SchedulerError::InvalidState => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "job is not running" })),
        ),
        SchedulerError::History(e) => {
            tracing::error!("history backend failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HashMap<String, String>> {
    let mut response = HashMap::new();
    response.insert("status".to_string(), "healthy".to_string());
    response.insert("service".to_string(), "evalgridd".to_string());
    Json(response)
}

/// Submit a benchmark run (single or matrix)
pub async fn submit_run(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request: RunRequest = serde_json::from_value(payload).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid request: {e}") })),
        )
    })?;

    match state.scheduler.submit(&request).await {
        Ok(status) => Ok(Json(status_json(&status)?)),
        Err(e) => Err(scheduler_error(e)),
    }
}

fn status_json(status: &evalgrid_orchestrator::JobStatus) -> Result<Value, ApiError> {
    serde_json::to_value(status).map_err(|e| {
        tracing::error!("failed to encode status: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal error" })),
        )
    })
}

/// Poll the status of a job
pub async fn get_status(
    State(state): State<Arc<ApiState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: JobId = job_id
        .parse()
        .map_err(|_| scheduler_error(SchedulerError::NotFound))?;

    match state.scheduler.status(id) {
        Ok(status) => Ok(Json(status_json(&status)?)),
        Err(e) => Err(scheduler_error(e)),
    }
}

/// Cancel a running job
pub async fn cancel_run(
    State(state): State<Arc<ApiState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: JobId = job_id
        .parse()
        .map_err(|_| scheduler_error(SchedulerError::NotFound))?;

    match state.scheduler.cancel(id) {
        Ok(status) => Ok(Json(json!({
            "state": status.state,
            "message": status.error.unwrap_or_else(|| "Cancelled by user".to_string()),
        }))),
        Err(e) => Err(scheduler_error(e)),
    }
}

/// Mine the recent run history for tuning suggestions
pub async fn get_suggestions(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Value>, ApiError> {
    let records = state
        .history
        .recent(ANALYSIS_WINDOW)
        .await
        .map_err(|e| scheduler_error(SchedulerError::History(e)))?;

    let suggestions = analyze(&records);
    Ok(Json(json!({ "suggestions": suggestions })))
}
