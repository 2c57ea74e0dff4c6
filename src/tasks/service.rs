//! Task submission and status queries
//!
//! Submission validates the request, seeds a pending record and hands the run
//! to a supervised background task before returning the new id.

use super::orchestrator::TaskOrchestrator;
use super::record::{TaskRecord, TaskStatus, Transition};
use super::store::TaskStore;
use crate::agents::{GenerationRequest, PipelineAgents};
use crate::error::{sanitize_error_message, AppError, AppResult};
use crate::observability::{metrics, MetricsCollector};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    orchestrator: Arc<TaskOrchestrator>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        agents: Arc<dyn PipelineAgents>,
        parallel_analysis: bool,
    ) -> Self {
        let orchestrator =
            TaskOrchestrator::new(store.clone(), agents).with_parallel_analysis(parallel_analysis);
        Self {
            store,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Accept a request and start its pipeline without waiting for it
    ///
    /// The record exists before this returns, so a status query with the
    /// returned id never misses it.
    pub async fn submit(&self, request: GenerationRequest) -> AppResult<Uuid> {
        if let Err(error) = request.validate() {
            metrics().task_rejected();
            debug!(error = %error, "Rejected generation request");
            return Err(error);
        }
        let request = request.normalized();

        let id = Uuid::new_v4();
        self.store.create(TaskRecord::pending(id)).await?;
        metrics().task_submitted();
        info!(
            task_id = %id,
            language = %request.language,
            complexity = %request.complexity,
            "Code generation task submitted"
        );

        self.spawn_supervised(id, request);
        Ok(id)
    }

    /// Current snapshot of a task; ids that do not parse are simply unknown
    pub async fn status_of(&self, task_id: &str) -> AppResult<TaskRecord> {
        let id = Uuid::parse_str(task_id).map_err(|_| AppError::task_not_found(task_id))?;
        self.store.get(id).await
    }

    fn spawn_supervised(&self, id: Uuid, request: GenerationRequest) {
        let orchestrator = self.orchestrator.clone();
        let store = self.store.clone();

        tokio::spawn(async move {
            let run = tokio::spawn(async move { orchestrator.run(id, request).await });

            match run.await {
                Ok(Ok(status)) => debug!(task_id = %id, %status, "Task run finished"),
                Ok(Err(e)) => error!(task_id = %id, error = %e, "Task run could not record its outcome"),
                Err(join_error) => {
                    let reason = if join_error.is_panic() {
                        panic_message(join_error.into_panic())
                    } else {
                        "cancelled".to_string()
                    };
                    error!(task_id = %id, reason = %reason, "Task run aborted");
                    mark_aborted(store.as_ref(), metrics(), id, &reason).await;
                }
            }
        });
    }
}

/// Move a record stranded by a crashed run to `failed`
///
/// Only a run that reached `processing` was counted as in flight.
async fn mark_aborted(
    store: &dyn TaskStore,
    collector: &MetricsCollector,
    id: Uuid,
    reason: &str,
) {
    let message = sanitize_error_message(&format!("Task aborted unexpectedly: {reason}"));

    let (was_started, result) = match store.get(id).await {
        Ok(record) if record.status.is_terminal() => return,
        Ok(record) if record.status == TaskStatus::Pending => {
            let result = match store.update(id, Transition::Start).await {
                Ok(_) => store.update(id, Transition::Fail(message)).await,
                Err(e) => Err(e),
            };
            (false, result)
        }
        Ok(_) => (true, store.update(id, Transition::Fail(message)).await),
        Err(e) => (false, Err(e)),
    };

    match result {
        Ok(_) if was_started => collector.task_failed(Duration::ZERO),
        Ok(_) => collector.task_failed_before_start(),
        Err(e) => warn!(task_id = %id, error = %e, "Could not mark aborted task as failed"),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
