//! Service info and health.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use paperlens_runtime::TaskStatus;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
}

/// GET /api — API description and startup capabilities.
async fn info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "PaperLens research paper processing API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "/api/upload-pdf",
            "process": "/api/process/{task_id}",
            "process_sync": "/api/process-sync/{task_id}",
            "status": "/api/status/{task_id}",
            "tasks": "/api/tasks",
            "health": "/api/health",
        },
        "capabilities": state.capabilities,
        "extraction_route": state.capabilities.extraction_route().to_string(),
    }))
}

/// GET /api/health — component status, structurer statistics, task counts.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let caps = state.capabilities;
    let stats = state.orchestrator.processor().stats();
    let tasks = state.orchestrator.list();
    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": state.uptime_secs(),
        "components": {
            "api": "running",
            "structuring_service": if caps.structuring_service { "healthy" } else { "unavailable" },
            "summarizer": match &state.model {
                Some(model) => model.as_str(),
                None => "unavailable",
            },
            "local_extraction": if caps.local_extraction { "available" } else { "unavailable" },
        },
        "processing_stats": {
            "primary_success": stats.primary_success,
            "primary_timeout": stats.primary_timeout,
            "fallback_used": stats.fallback_used,
            "total_processed": stats.total_processed,
            "failures": stats.failures,
        },
        "tasks": {
            "total": tasks.len(),
            "uploaded": count(TaskStatus::Uploaded),
            "processing": count(TaskStatus::Processing),
            "completed": count(TaskStatus::Completed),
            "failed": count(TaskStatus::Failed),
        },
    }))
}
