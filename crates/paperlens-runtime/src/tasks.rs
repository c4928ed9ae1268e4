//! Lock-guarded task table.
//!
//! Every transition rewrites status, timestamp and payload under a single
//! write lock, so readers never see a half-applied update.

use std::collections::HashMap;

use chrono::Utc;
use paperlens_core::{Error, Result};
use parking_lot::RwLock;
use tracing::info;

use crate::types::{PaperSummary, TaskRecord, TaskStatus};

#[derive(Default)]
pub struct TaskTable {
    tasks: RwLock<HashMap<String, TaskRecord>>,
}

fn not_found(task_id: &str) -> Error {
    Error::NotFound(format!("Task {} not found", task_id))
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: TaskRecord) {
        self.tasks.write().insert(record.task_id.clone(), record);
    }

    pub fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.read().get(task_id).cloned()
    }

    /// All tasks, oldest upload first.
    pub fn list(&self) -> Vec<TaskRecord> {
        let mut all: Vec<TaskRecord> = self.tasks.read().values().cloned().collect();
        all.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.task_id.cmp(&b.task_id)));
        all
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Exclusive uploaded → processing. Exactly one caller wins per task.
    pub fn begin_processing(&self, task_id: &str) -> Result<TaskRecord> {
        let mut tasks = self.tasks.write();
        let task = tasks.get_mut(task_id).ok_or_else(|| not_found(task_id))?;
        if task.status != TaskStatus::Uploaded {
            return Err(Error::Conflict(format!(
                "Task {} is already {}",
                task_id, task.status
            )));
        }
        task.status = TaskStatus::Processing;
        task.started_at = Some(Utc::now());
        info!("Task {}: uploaded -> processing", task_id);
        Ok(task.clone())
    }

    fn finish(
        &self,
        task_id: &str,
        apply: impl FnOnce(&mut TaskRecord),
    ) -> Result<TaskRecord> {
        let mut tasks = self.tasks.write();
        let task = tasks.get_mut(task_id).ok_or_else(|| not_found(task_id))?;
        if task.status != TaskStatus::Processing {
            return Err(Error::Conflict(format!(
                "Task {} is {}, not processing",
                task_id, task.status
            )));
        }
        apply(task);
        info!("Task {}: processing -> {}", task_id, task.status);
        Ok(task.clone())
    }

    /// processing → completed with the result attached.
    pub fn complete(&self, task_id: &str, result: PaperSummary) -> Result<TaskRecord> {
        self.finish(task_id, |task| {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
            task.result = Some(result);
        })
    }

    /// processing → failed with the error message attached.
    pub fn fail(&self, task_id: &str, error: impl Into<String>) -> Result<TaskRecord> {
        let error = error.into();
        self.finish(task_id, |task| {
            task.status = TaskStatus::Failed;
            task.failed_at = Some(Utc::now());
            task.error = Some(error);
        })
    }

    /// Remove a task in any state.
    pub fn remove(&self, task_id: &str) -> Result<TaskRecord> {
        self.tasks
            .write()
            .remove(task_id)
            .ok_or_else(|| not_found(task_id))
    }
}
