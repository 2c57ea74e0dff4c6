//! LLM-backed agent plumbing
//!
//! [`LlmAgent`] is one named conversation partner with a fixed system prompt.
//! [`LlmPipelineAgents`] bundles the five stage agents behind the
//! [`PipelineAgents`] trait.

use super::codegen::CodegenAgent;
use super::models::{GenerationRequest, OptimizationResult, ReviewResult, Specification, TestResult};
use super::optimization::OptimizationAgent;
use super::requirements::RequirementsAgent;
use super::review::ReviewAgent;
use super::test_generation::TestGenerationAgent;
use super::{PipelineAgents, Stage};
use crate::config::LlmSection;
use crate::error::{AppError, AppResult};
use crate::llm::provider::{CompletionRequest, LlmProvider, Message};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Model parameters shared by every stage agent
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl From<&LlmSection> for CompletionSettings {
    fn from(section: &LlmSection) -> Self {
        Self {
            model: section.model.clone(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
        }
    }
}

/// A named agent with a fixed system prompt
pub struct LlmAgent {
    name: &'static str,
    stage: Stage,
    system_prompt: &'static str,
    provider: Arc<dyn LlmProvider>,
    settings: CompletionSettings,
}

impl LlmAgent {
    pub fn new(
        name: &'static str,
        stage: Stage,
        system_prompt: &'static str,
        provider: Arc<dyn LlmProvider>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            name,
            stage,
            system_prompt,
            provider,
            settings,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Send one user prompt and return the non-empty reply text
    pub async fn ask(&self, prompt: String) -> AppResult<String> {
        let mut metadata = HashMap::new();
        metadata.insert("agent".to_string(), self.name.to_string());
        metadata.insert("stage".to_string(), self.stage.as_str().to_string());

        let request = CompletionRequest {
            messages: vec![Message::system(self.system_prompt), Message::user(prompt)],
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            metadata,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| AppError::from(e).in_stage(self.stage))?;

        debug!(
            agent = self.name,
            total_tokens = response.usage.total_tokens,
            "Agent reply received"
        );

        response
            .content
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                AppError::stage_failed(
                    self.stage,
                    format!("{} returned an empty response", self.name),
                )
            })
    }
}

/// Pull the first fenced code block out of a reply, or return the reply trimmed
pub fn extract_code(reply: &str) -> String {
    let Some(start) = reply.find("```") else {
        return reply.trim().to_string();
    };

    let after_fence = &reply[start + 3..];
    // Skip the info string (e.g. "python") up to the end of the fence line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];

    match body.find("```") {
        Some(end) => body[..end].trim().to_string(),
        None => body.trim().to_string(),
    }
}

/// The production [`PipelineAgents`] implementation
pub struct LlmPipelineAgents {
    requirements: RequirementsAgent,
    codegen: CodegenAgent,
    review: ReviewAgent,
    optimization: OptimizationAgent,
    testing: TestGenerationAgent,
}

impl LlmPipelineAgents {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self {
            requirements: RequirementsAgent::new(provider.clone(), settings.clone()),
            codegen: CodegenAgent::new(provider.clone(), settings.clone()),
            review: ReviewAgent::new(provider.clone(), settings.clone()),
            optimization: OptimizationAgent::new(provider.clone(), settings.clone()),
            testing: TestGenerationAgent::new(provider, settings),
        }
    }
}

#[async_trait]
impl PipelineAgents for LlmPipelineAgents {
    async fn analyze_requirements(&self, request: &GenerationRequest) -> AppResult<Specification> {
        self.requirements.analyze(request).await
    }

    async fn generate_code(&self, specification: &Specification) -> AppResult<String> {
        self.codegen.generate(specification).await
    }

    async fn review_code(&self, code: &str) -> AppResult<ReviewResult> {
        self.review.review(code).await
    }

    async fn optimize_code(&self, code: &str) -> AppResult<OptimizationResult> {
        self.optimization.optimize(code).await
    }

    async fn generate_tests(&self, code: &str) -> AppResult<TestResult> {
        self.testing.generate(code).await
    }
}
