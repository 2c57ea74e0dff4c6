//! Data models flowing through the generation pipeline

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A code generation request as submitted by a caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    pub requirements: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Free-form tier such as "simple", "medium" or "complex"
    #[serde(default = "default_complexity")]
    pub complexity: String,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_complexity() -> String {
    "medium".to_string()
}

fn normalize_or(value: &str, fallback: fn() -> String) -> String {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        fallback()
    } else {
        value
    }
}

impl GenerationRequest {
    pub fn new(requirements: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            language: default_language(),
            complexity: default_complexity(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_complexity(mut self, complexity: impl Into<String>) -> Self {
        self.complexity = complexity.into();
        self
    }

    /// Reject requests that cannot start a pipeline run
    pub fn validate(&self) -> AppResult<()> {
        if self.requirements.trim().is_empty() {
            return Err(AppError::validation("requirements must not be empty"));
        }
        Ok(())
    }

    /// Trimmed requirements; lowercase language and complexity, blanks defaulted
    pub fn normalized(self) -> Self {
        Self {
            requirements: self.requirements.trim().to_string(),
            language: normalize_or(&self.language, default_language),
            complexity: normalize_or(&self.complexity, default_complexity),
        }
    }
}

/// Structured specification produced by requirements analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Specification {
    pub original_requirements: String,
    pub language: String,
    pub complexity: String,
    /// Free-form analysis text returned by the model
    pub analysis: String,
    pub functional_requirements: Vec<String>,
    pub non_functional_requirements: Vec<String>,
    pub constraints: Vec<String>,
}

/// Outcome of the code review stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewResult {
    pub code: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    #[serde(rename = "pep8_compliance")]
    pub style_compliance: bool,
    pub review_comments: Vec<String>,
}

/// Outcome of the optimization stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationResult {
    pub original_code: String,
    pub optimized_code: String,
    pub improvements: Vec<String>,
    /// Estimated gain in percent
    pub performance_gain: f64,
}

/// Outcome of the test generation stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub source_code: String,
    pub test_code: String,
    pub test_cases: Vec<String>,
    pub coverage_percentage: f64,
}

/// Combined result of a fully successful pipeline run, keyed by stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineOutput {
    pub specification: Specification,
    pub generated_code: String,
    pub review_result: ReviewResult,
    pub optimization_result: OptimizationResult,
    pub test_result: TestResult,
}
