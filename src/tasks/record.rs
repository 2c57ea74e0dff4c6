//! Task records and their lifecycle state machine

use crate::agents::PipelineOutput;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Public lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Allowed edges: pending -> processing -> {completed, failed}
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A status change requested by the orchestrator
#[derive(Debug, Clone)]
pub enum Transition {
    Start,
    Complete(Box<PipelineOutput>),
    Fail(String),
}

impl Transition {
    pub fn target(&self) -> TaskStatus {
        match self {
            Transition::Start => TaskStatus::Processing,
            Transition::Complete(_) => TaskStatus::Completed,
            Transition::Fail(_) => TaskStatus::Failed,
        }
    }
}

/// Stored state of one task
///
/// `result` is set only when completed and `error` only when failed; both are
/// written together with `status` by [`TaskRecord::apply`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    #[serde(rename = "task_id")]
    pub id: Uuid,
    pub status: TaskStatus,
    pub result: Option<PipelineOutput>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn pending(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition, rejecting edges outside the state machine
    pub fn apply(&mut self, transition: Transition) -> AppResult<()> {
        let next = transition.target();
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        match transition {
            Transition::Start => {}
            Transition::Complete(output) => self.result = Some(*output),
            Transition::Fail(message) => {
                let message = message.trim();
                self.error = Some(if message.is_empty() {
                    "Task failed without an error message".to_string()
                } else {
                    message.to_string()
                });
            }
        }

        self.status = next;
        self.updated_at = Utc::now().max(self.updated_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{OptimizationResult, ReviewResult, Specification, TestResult};
    use proptest::prelude::*;

    fn output() -> PipelineOutput {
        PipelineOutput {
            specification: Specification {
                original_requirements: "add".to_string(),
                language: "python".to_string(),
                complexity: "simple".to_string(),
                analysis: String::new(),
                functional_requirements: vec![],
                non_functional_requirements: vec![],
                constraints: vec![],
            },
            generated_code: "def add(a, b): return a + b".to_string(),
            review_result: ReviewResult {
                code: String::new(),
                issues: vec![],
                suggestions: vec![],
                style_compliance: true,
                review_comments: vec![],
            },
            optimization_result: OptimizationResult {
                original_code: String::new(),
                optimized_code: String::new(),
                improvements: vec![],
                performance_gain: 0.0,
            },
            test_result: TestResult {
                source_code: String::new(),
                test_code: String::new(),
                test_cases: vec![],
                coverage_percentage: 0.0,
            },
        }
    }

    #[test]
    fn test_happy_path() {
        let mut record = TaskRecord::pending(Uuid::new_v4());
        assert_eq!(record.status, TaskStatus::Pending);

        record.apply(Transition::Start).unwrap();
        assert_eq!(record.status, TaskStatus::Processing);
        assert!(record.result.is_none());

        record
            .apply(Transition::Complete(Box::new(output())))
            .unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert!(record.result.is_some());
        assert!(record.error.is_none());
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn test_failure_records_error_without_result() {
        let mut record = TaskRecord::pending(Uuid::new_v4());
        record.apply(Transition::Start).unwrap();
        record
            .apply(Transition::Fail("Code review failed: timeout".to_string()))
            .unwrap();

        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("Code review failed: timeout"));
        assert!(record.result.is_none());
    }

    #[test]
    fn test_blank_failure_message_is_replaced() {
        let mut record = TaskRecord::pending(Uuid::new_v4());
        record.apply(Transition::Start).unwrap();
        record.apply(Transition::Fail("  ".to_string())).unwrap();
        assert!(!record.error.unwrap().is_empty());
    }

    #[test]
    fn test_cannot_skip_processing() {
        let mut record = TaskRecord::pending(Uuid::new_v4());
        let error = record
            .apply(Transition::Fail("boom".to_string()))
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Invalid status transition from pending to failed"
        );
        assert_eq!(record.status, TaskStatus::Pending);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let record = TaskRecord::pending(Uuid::nil());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["task_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["status"], "pending");
        assert!(json["result"].is_null());
        assert!(json["error"].is_null());
        assert!(json.get("created_at").is_some());
        assert!(json.get("updated_at").is_some());
    }

    fn transition_strategy() -> impl Strategy<Value = Transition> {
        prop_oneof![
            Just(Transition::Start),
            Just(Transition::Fail("failed".to_string())),
            Just(Transition::Complete(Box::new(output()))),
        ]
    }

    proptest! {
        #[test]
        fn prop_terminal_states_are_final(transitions in prop::collection::vec(transition_strategy(), 0..12)) {
            let mut record = TaskRecord::pending(Uuid::new_v4());
            let mut previous_updated = record.updated_at;

            for transition in transitions {
                let before = record.status;
                let applied = record.apply(transition).is_ok();

                if before.is_terminal() {
                    prop_assert!(!applied);
                    prop_assert_eq!(record.status, before);
                }
                prop_assert!(record.updated_at >= previous_updated);
                prop_assert_eq!(record.result.is_some(), record.status == TaskStatus::Completed);
                prop_assert_eq!(record.error.is_some(), record.status == TaskStatus::Failed);
                previous_updated = record.updated_at;
            }
        }
    }
}
