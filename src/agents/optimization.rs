//! Code optimization agent

use super::llm_agent::{extract_code, CompletionSettings, LlmAgent};
use super::models::OptimizationResult;
use super::Stage;
use crate::error::AppResult;
use crate::llm::provider::LlmProvider;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are an expert code optimizer. Optimize code for better performance, readability, and maintainability.

When optimizing code, consider:
1. Algorithmic improvements for better performance
2. Code readability and maintainability
3. Memory usage optimization
4. Elimination of redundant operations
5. Better data structure choices
6. Improved error handling

Return the optimized code in a single fenced code block, followed by a short explanation.";

/// Gain reported whenever the model actually changed the code
const ESTIMATED_GAIN_PERCENT: f64 = 15.0;

pub struct OptimizationAgent {
    llm: LlmAgent,
}

impl OptimizationAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self {
            llm: LlmAgent::new(
                "OptimizationAgent",
                Stage::CodeOptimization,
                SYSTEM_PROMPT,
                provider,
                settings,
            ),
        }
    }

    pub async fn optimize(&self, code: &str) -> AppResult<OptimizationResult> {
        let opportunities = identify_optimization_opportunities(code);
        let listed = if opportunities.is_empty() {
            "None identified".to_string()
        } else {
            opportunities.join(", ")
        };

        let prompt = format!(
            "Optimize the following code for better performance, readability, and maintainability:\n\n\
             Original Code:\n```\n{code}\n```\n\n\
             Identified Opportunities:\n{listed}\n\n\
             Provide optimized code with detailed explanations of the improvements made."
        );
        let reply = self.llm.ask(prompt).await?;
        let optimized_code = extract_code(&reply);

        let mut improvements = opportunities;
        improvements.push("Code optimized by AI assistant".to_string());

        Ok(OptimizationResult {
            performance_gain: estimate_performance_gain(code, &optimized_code),
            original_code: code.to_string(),
            optimized_code,
            improvements,
        })
    }
}

pub fn identify_optimization_opportunities(code: &str) -> Vec<String> {
    let mut opportunities = Vec::new();

    if code.contains("for ") && code.contains("range(") {
        opportunities
            .push("Consider using list comprehensions or generator expressions".to_string());
    }

    if code.contains("import ") {
        opportunities.push("Check for unused imports".to_string());
    }

    if code.lines().count() > 50 {
        opportunities.push("Consider breaking code into smaller functions".to_string());
    }

    opportunities
}

pub fn estimate_performance_gain(original_code: &str, optimized_code: &str) -> f64 {
    if original_code.trim() == optimized_code.trim() {
        0.0
    } else {
        ESTIMATED_GAIN_PERCENT
    }
}
