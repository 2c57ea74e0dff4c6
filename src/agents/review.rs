//! Code review agent
//!
//! Combines a handful of cheap local checks with free-form model feedback.

use super::llm_agent::{CompletionSettings, LlmAgent};
use super::models::ReviewResult;
use super::Stage;
use crate::error::AppResult;
use crate::llm::provider::LlmProvider;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are an expert code reviewer. Review code for quality, style compliance, and best practices.

When reviewing code, consider:
1. Style guide compliance and formatting
2. Readability and maintainability
3. Error handling and edge cases
4. Performance and efficiency
5. Security considerations
6. Best practices and design patterns

Provide detailed feedback with specific, actionable suggestions.";

const MAX_LINE_LENGTH: usize = 79;
const LONG_CODE_LINES: usize = 100;
const MAX_STYLE_COMMENTS: usize = 10;

pub struct ReviewAgent {
    llm: LlmAgent,
}

impl ReviewAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionSettings) -> Self {
        Self {
            llm: LlmAgent::new(
                "ReviewAgent",
                Stage::CodeReview,
                SYSTEM_PROMPT,
                provider,
                settings,
            ),
        }
    }

    pub async fn review(&self, code: &str) -> AppResult<ReviewResult> {
        let style_violations = check_style(code);
        let issues = identify_issues(code);
        let suggestions = suggest_improvements(code);

        let prompt = format!(
            "Review the following code for quality, style compliance and best practices:\n\n\
             ```\n{code}\n```\n\n\
             Provide detailed feedback and specific suggestions for improvement."
        );
        let feedback = self.llm.ask(prompt).await?;

        let mut review_comments = Vec::new();
        if !style_violations.is_empty() {
            review_comments.push("Code does not fully comply with style guidelines".to_string());
            review_comments.extend(
                style_violations
                    .iter()
                    .take(MAX_STYLE_COMMENTS)
                    .map(|v| format!("Style: {v}")),
            );
        }
        review_comments.extend(issues.iter().map(|i| format!("Issue: {i}")));
        review_comments.extend(suggestions.iter().map(|s| format!("Suggestion: {s}")));
        review_comments.push(format!("Agent feedback: {feedback}"));

        Ok(ReviewResult {
            code: code.to_string(),
            issues,
            suggestions,
            style_compliance: style_violations.is_empty(),
            review_comments,
        })
    }
}

/// Line-level style violations: overlong lines, trailing whitespace, tab indentation
pub fn check_style(code: &str) -> Vec<String> {
    let mut violations = Vec::new();

    for (index, line) in code.lines().enumerate() {
        let number = index + 1;
        let length = line.chars().count();
        if length > MAX_LINE_LENGTH {
            violations.push(format!(
                "line {number} is {length} characters (max {MAX_LINE_LENGTH})"
            ));
        }
        if line.ends_with(' ') || line.ends_with('\t') {
            violations.push(format!("line {number} has trailing whitespace"));
        }
        if line.starts_with('\t') {
            violations.push(format!("line {number} is indented with tabs"));
        }
    }

    violations
}

pub fn identify_issues(code: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if code.contains("import *") {
        issues.push("Avoid 'import *' statements".to_string());
    }

    if code.lines().count() > LONG_CODE_LINES {
        issues.push("Consider breaking long functions into smaller ones".to_string());
    }

    issues
}

pub fn suggest_improvements(code: &str) -> Vec<String> {
    let mut suggestions = Vec::new();

    if code.contains("TODO") {
        suggestions.push("Replace TODO comments with actual implementation".to_string());
    }

    if code.contains("print(") {
        suggestions.push("Consider using logging instead of print statements".to_string());
    }

    suggestions
}
