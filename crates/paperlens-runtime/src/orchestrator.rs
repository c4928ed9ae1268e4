//! Task orchestration: upload, background processing, sync processing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use paperlens_core::{Error, Result};
use paperlens_ingest::validate_upload;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::processor::PaperProcessor;
use crate::tasks::TaskTable;
use crate::types::TaskRecord;

pub struct TaskOrchestrator {
    table: Arc<TaskTable>,
    processor: Arc<PaperProcessor>,
    uploads_dir: PathBuf,
    max_upload_bytes: u64,
}

impl TaskOrchestrator {
    pub fn new(
        processor: Arc<PaperProcessor>,
        uploads_dir: impl Into<PathBuf>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            table: Arc::new(TaskTable::new()),
            processor,
            uploads_dir: uploads_dir.into(),
            max_upload_bytes,
        }
    }

    pub fn processor(&self) -> &PaperProcessor {
        &self.processor
    }

    pub fn table(&self) -> &TaskTable {
        &self.table
    }

    /// Validate and store an upload as `<uploads>/<task_id>.pdf`.
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<TaskRecord> {
        validate_upload(filename, bytes.len() as u64, self.max_upload_bytes)?;

        let task_id = uuid::Uuid::new_v4().to_string();
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        let path = self.uploads_dir.join(format!("{}.pdf", task_id));
        tokio::fs::write(&path, bytes).await?;

        let record = TaskRecord::new(&task_id, filename, path);
        self.table.insert(record.clone());
        info!(
            "Upload {} stored as task {} ({} bytes)",
            filename,
            task_id,
            bytes.len()
        );
        Ok(record)
    }

    /// Claim the task and run it in the background.
    fn spawn_job(&self, task_id: &str) -> Result<(TaskRecord, JoinHandle<()>)> {
        let record = self.table.begin_processing(task_id)?;

        let table = self.table.clone();
        let processor = self.processor.clone();
        let id = record.task_id.clone();
        let path = record.file_path.clone();
        let handle = tokio::spawn(async move {
            let outcome = match processor.process(&path).await {
                Ok(summary) => table.complete(&id, summary),
                Err(e) => {
                    warn!("Task {} failed: {}", id, e);
                    table.fail(&id, e.to_string())
                }
            };
            // Only a concurrent delete can make the final transition fail.
            if let Err(e) = outcome {
                error!("Task {}: could not record outcome: {}", id, e);
            }
        });
        Ok((record, handle))
    }

    /// Start background processing and return immediately.
    pub fn start_processing(&self, task_id: &str) -> Result<TaskRecord> {
        let (record, _handle) = self.spawn_job(task_id)?;
        Ok(record)
    }

    /// Process and wait up to `bound` for a terminal state. On expiry the
    /// job keeps running and `Timeout` is returned.
    pub async fn process_sync(&self, task_id: &str, bound: Duration) -> Result<TaskRecord> {
        let (_, handle) = self.spawn_job(task_id)?;
        match tokio::time::timeout(bound, handle).await {
            Ok(Ok(())) => self.status(task_id),
            Ok(Err(e)) => Err(Error::Internal(format!(
                "Processing job for {} panicked: {}",
                task_id, e
            ))),
            Err(_) => {
                warn!(
                    "Task {} still processing after {}s",
                    task_id,
                    bound.as_secs()
                );
                Err(Error::Timeout {
                    context: format!("Processing task {}", task_id),
                    secs: bound.as_secs(),
                })
            }
        }
    }

    pub fn status(&self, task_id: &str) -> Result<TaskRecord> {
        self.table
            .get(task_id)
            .ok_or_else(|| Error::NotFound(format!("Task {} not found", task_id)))
    }

    pub fn list(&self) -> Vec<TaskRecord> {
        self.table.list()
    }

    /// Remove the task record and its uploaded file.
    pub async fn delete(&self, task_id: &str) -> Result<TaskRecord> {
        let record = self.table.remove(task_id)?;
        match tokio::fs::remove_file(&record.file_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Task {}: could not remove {}: {}",
                task_id,
                record.file_path.display(),
                e
            ),
        }
        info!("Task {} deleted", task_id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::processor::tests::processor;
    use crate::types::TaskStatus;

    fn orchestrator(root: &Path, delay: Duration) -> TaskOrchestrator {
        TaskOrchestrator::new(
            Arc::new(processor(&root.join("outputs"), delay)),
            root.join("uploads"),
            1024,
        )
    }

    async fn wait_terminal(orch: &TaskOrchestrator, id: &str) -> TaskRecord {
        for _ in 0..200 {
            let record = orch.status(id).unwrap();
            if record.status.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {} never finished", id);
    }

    #[tokio::test]
    async fn test_upload_stores_file_by_task_id() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);
        let record = orch.upload("paper.pdf", b"%PDF-1.4 x").await.unwrap();

        assert_eq!(record.status, TaskStatus::Uploaded);
        assert_eq!(record.filename, "paper.pdf");
        assert_eq!(
            record.file_path,
            tmp.path().join("uploads").join(format!("{}.pdf", record.task_id))
        );
        assert!(record.file_path.exists());
        assert_eq!(orch.list().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejections_store_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);

        assert!(matches!(
            orch.upload("notes.txt", b"text").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            orch.upload("big.pdf", &[0u8; 2048]).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(orch.upload("empty.pdf", b"").await, Err(Error::Validation(_))));
        assert!(orch.list().is_empty());
    }

    #[tokio::test]
    async fn test_background_processing_completes() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);
        let id = orch.upload("paper.pdf", b"%PDF-1.4 x").await.unwrap().task_id;

        let started = orch.start_processing(&id).unwrap();
        assert_eq!(started.status, TaskStatus::Processing);
        assert!(matches!(orch.start_processing(&id), Err(Error::Conflict(_))));

        let done = wait_terminal(&orch, &id).await;
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());
        let result = done.result.unwrap();
        assert_eq!(result.paper_id, id);
        assert_eq!(result.title, "Sparse Attention for Long Documents");
    }

    #[tokio::test]
    async fn test_failed_extraction_marks_task_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);
        let id = orch.upload("paper.pdf", b"bad pdf").await.unwrap().task_id;

        let done = orch
            .process_sync(&id, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert!(done.error.is_some());
        assert!(done.result.is_none());
    }

    #[tokio::test]
    async fn test_sync_processing_returns_completed_record() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);
        let id = orch.upload("paper.pdf", b"%PDF-1.4 x").await.unwrap().task_id;

        let done = orch
            .process_sync(&id, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.result.is_some());
    }

    #[tokio::test]
    async fn test_sync_timeout_leaves_job_running() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::from_millis(300));
        let id = orch.upload("paper.pdf", b"%PDF-1.4 x").await.unwrap().task_id;

        let err = orch
            .process_sync(&id, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(orch.status(&id).unwrap().status, TaskStatus::Processing);

        let done = wait_terminal(&orch, &id).await;
        assert_eq!(done.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);
        let record = orch.upload("paper.pdf", b"%PDF-1.4 x").await.unwrap();

        orch.delete(&record.task_id).await.unwrap();
        assert!(!record.file_path.exists());
        assert!(matches!(orch.status(&record.task_id), Err(Error::NotFound(_))));
        assert!(matches!(
            orch.delete(&record.task_id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let orch = orchestrator(tmp.path(), Duration::ZERO);
        let record = orch.upload("paper.pdf", b"%PDF-1.4 x").await.unwrap();
        std::fs::remove_file(&record.file_path).unwrap();
        assert!(orch.delete(&record.task_id).await.is_ok());
    }
}
