//! Requirements analysis agent

use super::llm_agent::{CompletionSettings, LlmAgent};
use super::models::{GenerationRequest, Specification};
use super::Stage;
use crate::error::AppResult;
use crate::llm::provider::LlmProvider;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are an expert at analyzing and breaking down programming requirements.
Your task is to understand user requirements and create a detailed specification for code implementation.

When analyzing requirements, consider:
1. What functionality needs to be implemented
2. What inputs and outputs are expected
3. Any specific constraints or requirements
4. Non-functional expectations such as performance or robustness
5. Complexity level of the implementation

Group your answer under the headings \"Functional requirements\", \
\"Non-functional requirements\" and \"Constraints\", one bullet per item.";

pub struct RequirementsAgent {
    llm: LlmAgent,
}

impl RequirementsAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self {
            llm: LlmAgent::new(
                "RequirementsAgent",
                Stage::RequirementsAnalysis,
                SYSTEM_PROMPT,
                provider,
                settings,
            ),
        }
    }

    pub async fn analyze(&self, request: &GenerationRequest) -> AppResult<Specification> {
        let prompt = format!(
            "Analyze the following requirements and provide a detailed specification: {}\n\
             Target language: {}\n\
             Complexity: {}",
            request.requirements, request.language, request.complexity
        );

        let analysis = self.llm.ask(prompt).await?;
        Ok(breakdown_requirements(request, analysis))
    }
}

#[derive(Clone, Copy)]
enum Section {
    Functional,
    NonFunctional,
    Constraints,
}

/// Sort bullet points of the analysis under the heading they appear beneath
pub fn breakdown_requirements(request: &GenerationRequest, analysis: String) -> Specification {
    let mut functional = Vec::new();
    let mut non_functional = Vec::new();
    let mut constraints = Vec::new();
    let mut section = Section::Functional;

    for line in analysis.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match strip_bullet(line) {
            Some(item) if !item.is_empty() => {
                let target = match section {
                    Section::Functional => &mut functional,
                    Section::NonFunctional => &mut non_functional,
                    Section::Constraints => &mut constraints,
                };
                target.push(item.to_string());
            }
            Some(_) => {}
            None => {
                if let Some(next) = heading_section(line) {
                    section = next;
                }
            }
        }
    }

    Specification {
        original_requirements: request.requirements.clone(),
        language: request.language.clone(),
        complexity: request.complexity.clone(),
        analysis,
        functional_requirements: functional,
        non_functional_requirements: non_functional,
        constraints,
    }
}

fn heading_section(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    if lower.contains("non-functional") || lower.contains("non functional") {
        Some(Section::NonFunctional)
    } else if lower.contains("constraint") {
        Some(Section::Constraints)
    } else if lower.contains("functional") {
        Some(Section::Functional)
    } else {
        None
    }
}

/// Strip a list marker (`-`, `*`, `•`, `1.`, `2)`) and return the item text
fn strip_bullet(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(item) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(item.trim());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmProvider;

    const ANALYSIS: &str = "\
## Functional requirements
- Accept two numbers
- Return their sum

## Non-functional requirements
1. Run in constant time

### Constraints
* No external dependencies
";

    #[test]
    fn test_breakdown_sorts_items_by_heading() {
        let request = GenerationRequest::new("add two numbers");
        let spec = breakdown_requirements(&request, ANALYSIS.to_string());

        assert_eq!(
            spec.functional_requirements,
            vec!["Accept two numbers", "Return their sum"]
        );
        assert_eq!(spec.non_functional_requirements, vec!["Run in constant time"]);
        assert_eq!(spec.constraints, vec!["No external dependencies"]);
        assert_eq!(spec.original_requirements, "add two numbers");
        assert_eq!(spec.analysis, ANALYSIS);
    }

    #[test]
    fn test_breakdown_without_headings_defaults_to_functional() {
        let request = GenerationRequest::new("x");
        let spec = breakdown_requirements(&request, "- one\n- two".to_string());
        assert_eq!(spec.functional_requirements, vec!["one", "two"]);
        assert!(spec.constraints.is_empty());
    }

    #[test]
    fn test_breakdown_of_prose_keeps_lists_empty() {
        let request = GenerationRequest::new("x");
        let spec = breakdown_requirements(&request, "Just write a function.".to_string());
        assert!(spec.functional_requirements.is_empty());
        assert_eq!(spec.analysis, "Just write a function.");
    }

    #[test]
    fn test_strip_bullet_variants() {
        assert_eq!(strip_bullet("- item"), Some("item"));
        assert_eq!(strip_bullet("12. item"), Some("item"));
        assert_eq!(strip_bullet("3) item"), Some("item"));
        assert_eq!(strip_bullet("2024 was a year"), None);
        assert_eq!(strip_bullet("plain text"), None);
    }

    #[tokio::test]
    async fn test_analyze_carries_request_options() {
        let provider = Arc::new(MockLlmProvider::single_response(ANALYSIS));
        let agent = RequirementsAgent::new(
            provider.clone(),
            CompletionSettings {
                model: "mock-model".to_string(),
                temperature: None,
                max_tokens: None,
            },
        );

        let request = GenerationRequest::new("add two numbers")
            .with_language("rust")
            .with_complexity("simple");
        let spec = agent.analyze(&request).await.unwrap();

        assert_eq!(spec.language, "rust");
        assert_eq!(spec.complexity, "simple");

        let prompt = &provider.recorded_requests().await[0].messages[1].content;
        assert!(prompt.contains("add two numbers"));
        assert!(prompt.contains("Target language: rust"));
        assert!(prompt.contains("Complexity: simple"));
    }
}
