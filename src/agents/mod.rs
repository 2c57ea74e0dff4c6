//! Pipeline stage agents
//!
//! Each of the five pipeline stages is backed by an agent that wraps one LLM
//! conversation plus a few local heuristics. The orchestrator sees them only
//! through [`PipelineAgents`], so tests can swap in scripted implementations.

pub mod catalog;
pub mod codegen;
pub mod llm_agent;
pub mod models;
pub mod optimization;
pub mod requirements;
pub mod review;
pub mod test_generation;

use crate::error::AppResult;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub use catalog::{agent_catalog, AgentDescriptor};
pub use llm_agent::{CompletionSettings, LlmAgent, LlmPipelineAgents};
pub use models::*;

/// The five pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RequirementsAnalysis,
    CodeGeneration,
    CodeReview,
    CodeOptimization,
    TestGeneration,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::RequirementsAnalysis,
        Stage::CodeGeneration,
        Stage::CodeReview,
        Stage::CodeOptimization,
        Stage::TestGeneration,
    ];

    /// Machine-friendly name used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RequirementsAnalysis => "requirements_analysis",
            Stage::CodeGeneration => "code_generation",
            Stage::CodeReview => "code_review",
            Stage::CodeOptimization => "code_optimization",
            Stage::TestGeneration => "test_generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::RequirementsAnalysis => "Requirements analysis",
            Stage::CodeGeneration => "Code generation",
            Stage::CodeReview => "Code review",
            Stage::CodeOptimization => "Code optimization",
            Stage::TestGeneration => "Test generation",
        };
        f.write_str(label)
    }
}

/// Uniform async interface over the five stage agents
///
/// Implementations must not retry and must not substitute placeholder
/// results: a failure is returned as an error and ends the task.
#[async_trait]
pub trait PipelineAgents: Send + Sync {
    async fn analyze_requirements(&self, request: &GenerationRequest) -> AppResult<Specification>;

    async fn generate_code(&self, specification: &Specification) -> AppResult<String>;

    async fn review_code(&self, code: &str) -> AppResult<ReviewResult>;

    async fn optimize_code(&self, code: &str) -> AppResult<OptimizationResult>;

    async fn generate_tests(&self, code: &str) -> AppResult<TestResult>;
}
