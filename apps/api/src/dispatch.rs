//! Background dispatch for ingestion work.
//!
//! `TaskDispatcher` decouples "an upload was accepted" from "the resume has
//! been processed". `SpawnDispatcher` runs the work on the runtime and
//! returns immediately; `InlineDispatcher` finishes the work before
//! returning, which makes tests and small deployments deterministic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::{IngestStatus, Ingestor};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("timed out after {0:?} waiting for the task result")]
    Timeout(Duration),
    #[error("task was dropped before reporting a result")]
    Lost,
    #[error("ingestion task failed: {0}")]
    Failed(#[source] AppError),
}

/// Handle to one submitted ingestion task.
///
/// The id is reported to API clients; the receiver resolves once the task
/// finishes. Dropping the handle never cancels the work.
pub struct TaskHandle {
    task_id: Uuid,
    receiver: oneshot::Receiver<Result<IngestStatus, AppError>>,
}

impl TaskHandle {
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Waits for the task to finish, up to `timeout`.
    pub async fn wait(self, timeout: Duration) -> Result<IngestStatus, DispatchError> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(Ok(status))) => Ok(status),
            Ok(Ok(Err(e))) => Err(DispatchError::Failed(e)),
            Ok(Err(_)) => Err(DispatchError::Lost),
            Err(_) => Err(DispatchError::Timeout(timeout)),
        }
    }
}

#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Submits ingestion work for an application and returns its handle.
    async fn submit(&self, application_id: Uuid) -> TaskHandle;
}

/// Dispatches onto the runtime with `tokio::spawn`. Work survives the
/// submitting request; results are also logged, since nobody may be waiting.
pub struct SpawnDispatcher {
    ingestor: Arc<Ingestor>,
}

impl SpawnDispatcher {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self { ingestor }
    }
}

#[async_trait]
impl TaskDispatcher for SpawnDispatcher {
    async fn submit(&self, application_id: Uuid) -> TaskHandle {
        let task_id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();
        let ingestor = self.ingestor.clone();

        tokio::spawn(async move {
            let result = ingestor.process_application(application_id).await;
            match &result {
                Ok(status) => {
                    info!("task {task_id} for application {application_id} finished: {status:?}")
                }
                Err(e) => error!("task {task_id} for application {application_id} failed: {e}"),
            }
            // The submitter may have dropped the handle; that is fine.
            let _ = sender.send(result);
        });

        info!("submitted ingestion task {task_id} for application {application_id}");
        TaskHandle { task_id, receiver }
    }
}

/// Runs the work before `submit` returns. The handle resolves instantly.
pub struct InlineDispatcher {
    ingestor: Arc<Ingestor>,
}

impl InlineDispatcher {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self { ingestor }
    }
}

#[async_trait]
impl TaskDispatcher for InlineDispatcher {
    async fn submit(&self, application_id: Uuid) -> TaskHandle {
        let task_id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();

        let result = self.ingestor.process_application(application_id).await;
        if let Err(e) = &result {
            error!("inline task {task_id} for application {application_id} failed: {e}");
        }
        let _ = sender.send(result);

        TaskHandle { task_id, receiver }
    }
}
