//! Task listing and deletion.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};

use super::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/{task_id}", delete(delete_task))
}

/// GET /api/tasks — every task, oldest upload first.
async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let tasks: Vec<serde_json::Value> = state
        .orchestrator
        .list()
        .into_iter()
        .map(|task| {
            serde_json::json!({
                "task_id": task.task_id,
                "filename": task.filename,
                "status": task.status,
                "uploaded_at": task.uploaded_at,
            })
        })
        .collect();

    Json(serde_json::json!({
        "total_tasks": tasks.len(),
        "tasks": tasks,
    }))
}

/// DELETE /api/tasks/{task_id} — drop the record and its uploaded file.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.orchestrator.delete(&task_id).await?;
    Ok(Json(serde_json::json!({
        "message": format!("Task {} deleted successfully", record.task_id),
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::build_router;
    use crate::routes::tests::{delete, get, send, test_state, upload};

    #[tokio::test]
    async fn test_list_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        let uploads = state.config.data_paths.uploads.clone();
        let app = build_router(state);

        let (_, first) = send(&app, upload("a.pdf", b"%PDF-1.4 a")).await;
        let (_, _second) = send(&app, upload("b.pdf", b"%PDF-1.4 b")).await;
        let first_id = first["task_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get("/api/tasks")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_tasks"], 2);
        assert_eq!(body["tasks"][0]["status"], "uploaded");
        assert!(uploads.join(format!("{}.pdf", first_id)).exists());

        let (status, body) = send(&app, delete(&format!("/api/tasks/{}", first_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains(&first_id));
        assert!(!uploads.join(format!("{}.pdf", first_id)).exists());

        let (_, body) = send(&app, get("/api/tasks")).await;
        assert_eq!(body["total_tasks"], 1);

        let (status, _) = send(&app, delete(&format!("/api/tasks/{}", first_id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
