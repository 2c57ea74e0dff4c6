//! Code generation agent

use super::llm_agent::{extract_code, CompletionSettings, LlmAgent};
use super::models::Specification;
use super::Stage;
use crate::error::{AppError, AppResult};
use crate::llm::provider::LlmProvider;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are an expert software developer. Generate clean, efficient, and well-documented code \
based on the provided requirements.

When generating code, follow these guidelines:
1. Write clean, readable code that follows the idiomatic style of the target language
2. Include appropriate comments and docstrings
3. Handle edge cases and error conditions
4. Write efficient code with good performance
5. Include type annotations where the language supports them

Your response should be ONLY the generated code, with no additional explanation or markdown formatting.";

pub struct CodegenAgent {
    llm: LlmAgent,
}

impl CodegenAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self {
            llm: LlmAgent::new(
                "CodegenAgent",
                Stage::CodeGeneration,
                SYSTEM_PROMPT,
                provider,
                settings,
            ),
        }
    }

    pub async fn generate(&self, specification: &Specification) -> AppResult<String> {
        let reply = self.llm.ask(build_prompt(specification)).await?;

        let code = extract_code(&reply);
        if code.is_empty() {
            return Err(AppError::stage_failed(
                Stage::CodeGeneration,
                "model reply contained no code",
            ));
        }
        Ok(code)
    }
}

fn build_prompt(specification: &Specification) -> String {
    let mut prompt = format!(
        "Generate {} code for the following requirements:\n\
         Requirements: {}\n\
         Complexity: {}\n",
        specification.language, specification.original_requirements, specification.complexity
    );

    let sections = [
        ("Functional requirements", &specification.functional_requirements),
        (
            "Non-functional requirements",
            &specification.non_functional_requirements,
        ),
        ("Constraints", &specification.constraints),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        prompt.push_str(&format!("\n{title}:\n"));
        for item in items {
            prompt.push_str(&format!("- {item}\n"));
        }
    }

    prompt.push_str(
        "\nPlease generate clean, efficient, and well-documented code.\n\
         Include appropriate comments and follow best practices.",
    );
    prompt
}
