//! Error types for the code generation service
//!
//! Every failure in the service funnels into [`AppError`]. Stage failures are
//! recorded on the owning task record as a sanitized string; validation and
//! lookup failures surface to HTTP callers through the server's rejection
//! mapping.

use crate::agents::Stage;
use crate::llm::provider::LlmError;
use crate::tasks::TaskStatus;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Maximum length of an error message stored on a task record
const MAX_ERROR_MESSAGE_LEN: usize = 500;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

/// Main error type for the service
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Task already exists: {task_id}")]
    DuplicateTask { task_id: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("{stage} failed: {message}")]
    StageFailed { stage: Stage, message: String },

    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create not-found error for a task identifier
    pub fn task_not_found<S: Into<String>>(task_id: S) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    /// Create stage failure error
    pub fn stage_failed<S: Into<String>>(stage: Stage, message: S) -> Self {
        Self::StageFailed {
            stage,
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attribute this error to a pipeline stage, keeping existing attribution
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::StageFailed { .. } => self,
            other => Self::StageFailed {
                stage,
                message: other.to_string(),
            },
        }
    }

    /// Message suitable for storing on a failed task record
    pub fn to_task_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Redact secrets and sensitive paths, and cap the message length
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_ERROR_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for service operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_display_names_stage() {
        let error = AppError::stage_failed(Stage::CodeReview, "model timeout");
        assert_eq!(error.to_string(), "Code review failed: model timeout");
    }

    #[test]
    fn test_in_stage_wraps_llm_errors() {
        let error = AppError::from(LlmError::NetworkError("connection reset".to_string()))
            .in_stage(Stage::CodeGeneration);

        match error {
            AppError::StageFailed { stage, message } => {
                assert_eq!(stage, Stage::CodeGeneration);
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected stage failure, got {other:?}"),
        }
    }

    #[test]
    fn test_in_stage_keeps_original_attribution() {
        let error = AppError::stage_failed(Stage::RequirementsAnalysis, "bad")
            .in_stage(Stage::TestGeneration);
        assert!(matches!(
            error,
            AppError::StageFailed {
                stage: Stage::RequirementsAnalysis,
                ..
            }
        ));
    }

    #[test]
    fn test_task_message_is_sanitized() {
        let error = AppError::stage_failed(
            Stage::CodeGeneration,
            "Authentication failed: api_key=sk-12345 token=abc456",
        );

        let message = error.to_task_message();
        assert!(!message.contains("sk-12345"));
        assert!(!message.contains("abc456"));
        assert!(message.contains("key=***"));
        assert!(message.contains("token=***"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= MAX_ERROR_MESSAGE_LEN);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let sanitized = sanitize_error_message(&"é".repeat(400));
        assert!(sanitized.len() <= MAX_ERROR_MESSAGE_LEN);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_sensitive_path_redaction() {
        let sanitized = sanitize_error_message("Failed to read /home/user/.aws/credentials");
        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains(".aws/credentials"));
    }

    #[test]
    fn test_exactly_max_length_untouched() {
        let message = "x".repeat(MAX_ERROR_MESSAGE_LEN);
        assert_eq!(sanitize_error_message(&message), message);
    }

    #[test]
    fn test_validation_constructor() {
        let error = AppError::validation("requirements must not be empty");
        assert!(matches!(error, AppError::Validation { .. }));
        assert_eq!(
            error.to_string(),
            "Validation error: requirements must not be empty"
        );
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = AppError::InvalidTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::Processing,
        };
        assert_eq!(
            error.to_string(),
            "Invalid status transition from completed to processing"
        );
    }
}
