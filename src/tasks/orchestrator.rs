//! Drives the five-stage pipeline for one task
//!
//! The orchestrator owns the writes to its task's record: it moves the record
//! to `processing` before the first agent call and writes exactly one terminal
//! transition once every stage has finished or the first one has failed.

use super::record::{TaskStatus, Transition};
use super::store::TaskStore;
use crate::agents::{GenerationRequest, PipelineAgents, PipelineOutput, Stage};
use crate::error::AppResult;
use crate::observability::metrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

pub struct TaskOrchestrator {
    store: Arc<dyn TaskStore>,
    agents: Arc<dyn PipelineAgents>,
    parallel_analysis: bool,
}

impl TaskOrchestrator {
    pub fn new(store: Arc<dyn TaskStore>, agents: Arc<dyn PipelineAgents>) -> Self {
        Self {
            store,
            agents,
            parallel_analysis: false,
        }
    }

    /// Run review, optimization and test generation concurrently
    pub fn with_parallel_analysis(mut self, enabled: bool) -> Self {
        self.parallel_analysis = enabled;
        self
    }

    /// Run the pipeline for a pending task and return its terminal status
    ///
    /// Stage failures end up on the record, not in the returned error. An
    /// `Err` here means the record itself could not be updated.
    pub async fn run(&self, id: Uuid, request: GenerationRequest) -> AppResult<TaskStatus> {
        let span = crate::task_span!(task_id = %id, language = %request.language);

        async move {
            self.store.update(id, Transition::Start).await?;
            metrics().task_started();
            let started = Instant::now();
            info!("Task processing started");

            match self.execute(&request).await {
                Ok(output) => {
                    self.store
                        .update(id, Transition::Complete(Box::new(output)))
                        .await?;
                    let elapsed = started.elapsed();
                    metrics().task_completed(elapsed);
                    info!(elapsed_ms = elapsed.as_millis() as u64, "Task completed");
                    Ok(TaskStatus::Completed)
                }
                Err(error) => {
                    let message = error.to_task_message();
                    self.store.update(id, Transition::Fail(message.clone())).await?;
                    let elapsed = started.elapsed();
                    metrics().task_failed(elapsed);
                    info!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %message,
                        "Task failed"
                    );
                    Ok(TaskStatus::Failed)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, request: &GenerationRequest) -> AppResult<PipelineOutput> {
        let agents = &self.agents;

        let specification = run_stage(
            Stage::RequirementsAnalysis,
            agents.analyze_requirements(request),
        )
        .await?;
        let code = run_stage(Stage::CodeGeneration, agents.generate_code(&specification)).await?;

        // All three consume the stage-2 code and nothing else.
        let review = run_stage(Stage::CodeReview, agents.review_code(&code));
        let optimization = run_stage(Stage::CodeOptimization, agents.optimize_code(&code));
        let tests = run_stage(Stage::TestGeneration, agents.generate_tests(&code));

        let (review_result, optimization_result, test_result) = if self.parallel_analysis {
            tokio::try_join!(review, optimization, tests)?
        } else {
            (review.await?, optimization.await?, tests.await?)
        };

        Ok(PipelineOutput {
            specification,
            generated_code: code,
            review_result,
            optimization_result,
            test_result,
        })
    }
}

async fn run_stage<T, F>(stage: Stage, work: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let span = crate::stage_span!(stage = stage.as_str());
    let started = Instant::now();
    debug!(parent: &span, "Stage started");

    let result = work
        .instrument(span.clone())
        .await
        .map_err(|error| error.in_stage(stage));

    let elapsed = started.elapsed();
    metrics().stage_finished(stage, elapsed, result.is_ok());

    let elapsed_ms = elapsed.as_millis() as u64;
    match &result {
        Ok(_) => debug!(parent: &span, elapsed_ms, "Stage finished"),
        Err(error) => warn!(parent: &span, elapsed_ms, error = %error, "Stage failed"),
    }

    result
}
