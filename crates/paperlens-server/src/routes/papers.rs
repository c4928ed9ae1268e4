//! Upload, processing and status routes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use paperlens_core::Error;
use paperlens_runtime::{TaskRecord, TaskStatus};

use super::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-pdf", post(upload_pdf))
        .route("/process/{task_id}", post(process))
        .route("/process-sync/{task_id}", post(process_sync))
        .route("/status/{task_id}", get(status))
}

/// POST /api/upload-pdf — store a PDF (multipart field `file`) as a new task.
async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Ok((e.status(), Json(serde_json::json!({ "error": e.body_text() })))
                    .into_response())
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| Error::Validation("Upload has no filename".into()))?;
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Ok((e.status(), Json(serde_json::json!({ "error": e.body_text() })))
                    .into_response())
            }
        };

        let record = state.orchestrator.upload(&filename, &bytes).await?;
        return Ok(Json(serde_json::json!({
            "task_id": record.task_id,
            "filename": record.filename,
            "status": record.status,
            "size": bytes.len(),
            "message": format!(
                "File uploaded successfully. Use /api/process/{}/ to start processing.",
                record.task_id
            ),
        }))
        .into_response());
    }
    Err(Error::Validation("Missing multipart field 'file'".into()).into())
}

/// POST /api/process/{task_id} — start background processing.
async fn process(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.orchestrator.start_processing(&task_id)?;
    Ok(Json(serde_json::json!({
        "task_id": record.task_id,
        "status": "processing_started",
        "message": format!(
            "Processing started in background. Check status with /api/status/{}",
            record.task_id
        ),
    })))
}

/// POST /api/process-sync/{task_id} — process and wait for the outcome.
async fn process_sync(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let bound = Duration::from_secs(state.config.sync_process_timeout_secs);
    let record = state.orchestrator.process_sync(&task_id, bound).await?;

    if record.status == TaskStatus::Failed {
        let error = record.error.unwrap_or_default();
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("Processing failed: {}", error) })),
        )
            .into_response());
    }
    Ok(Json(serde_json::json!({
        "task_id": record.task_id,
        "status": record.status,
        "result": record.result,
    }))
    .into_response())
}

fn status_message(record: &TaskRecord) -> &'static str {
    match record.status {
        TaskStatus::Uploaded => "Waiting for processing to be started",
        TaskStatus::Processing => "Processing in progress...",
        TaskStatus::Completed => "Processing completed successfully",
        TaskStatus::Failed => "Processing failed",
    }
}

/// GET /api/status/{task_id} — current state, result or error.
async fn status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.orchestrator.status(&task_id)?;
    let mut body = serde_json::to_value(&record).map_err(Error::from)?;
    body["message"] = status_message(&record).into();
    Ok(Json(body))
}
