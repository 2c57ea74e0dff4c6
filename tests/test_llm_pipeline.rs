//! Full pipeline runs against a mocked chat completions endpoint


use codegen_agents::agents::{CompletionSettings, GenerationRequest, LlmPipelineAgents};
use codegen_agents::config::LlmSection;
use codegen_agents::llm::build_provider;
use codegen_agents::tasks::TaskStatus;
use test_helpers::{test_service, wait_for_terminal};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_REPLY: &str = "Here you go:\n```python\ndef add(a, b):\n    return a + b\n```";

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": "mock-model",
        "choices": [
            {
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 20, "completion_tokens": 30, "total_tokens": 50}
    })
}

fn llm_agents(server: &MockServer) -> LlmPipelineAgents {
    let section = LlmSection {
        model: "mock-model".to_string(),
        base_url: Some(server.uri()),
        timeout_secs: 5,
        ..Default::default()
    };
    let provider = build_provider(&section, "test-api-key".to_string()).unwrap();
    LlmPipelineAgents::new(provider, CompletionSettings::from(&section))
}

#[tokio::test]
async fn test_pipeline_runs_every_agent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(MODEL_REPLY)))
        .mount(&server)
        .await;

    let service = test_service(llm_agents(&server));
    let id = service
        .submit(GenerationRequest::new("add two numbers"))
        .await
        .unwrap();
    let record = wait_for_terminal(&service, id).await;

    assert_eq!(record.status, TaskStatus::Completed, "error: {:?}", record.error);
    let output = record.result.unwrap();

    assert_eq!(output.specification.original_requirements, "add two numbers");
    assert_eq!(output.generated_code, "def add(a, b):\n    return a + b");
    assert_eq!(output.review_result.code, output.generated_code);
    assert!(output
        .review_result
        .review_comments
        .iter()
        .any(|comment| comment.starts_with("Agent feedback: ")));
    assert_eq!(output.optimization_result.performance_gain, 0.0);
    assert_eq!(output.test_result.test_cases.len(), 4);
    assert_eq!(output.test_result.coverage_percentage, 100.0);

    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_generated_code_flows_into_later_prompts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(MODEL_REPLY)))
        .mount(&server)
        .await;

    let service = test_service(llm_agents(&server));
    let id = service
        .submit(GenerationRequest::new("add two numbers"))
        .await
        .unwrap();
    wait_for_terminal(&service, id).await;

    let requests = server.received_requests().await.unwrap();
    let prompts: Vec<String> = requests
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["messages"][1]["content"].as_str().unwrap().to_string()
        })
        .collect();

    assert!(prompts[0].contains("add two numbers"));
    for prompt in &prompts[2..] {
        assert!(prompt.contains("def add(a, b):"), "prompt lacks code: {prompt}");
    }
}

#[tokio::test]
async fn test_provider_rejection_fails_task_at_first_stage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let service = test_service(llm_agents(&server));
    let id = service
        .submit(GenerationRequest::new("add two numbers"))
        .await
        .unwrap();
    let record = wait_for_terminal(&service, id).await;

    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.result.is_none());
    assert!(record
        .error
        .unwrap()
        .starts_with("Requirements analysis failed"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_model_reply_fails_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
        .mount(&server)
        .await;

    let service = test_service(llm_agents(&server));
    let id = service.submit(GenerationRequest::new("anything")).await.unwrap();
    let record = wait_for_terminal(&service, id).await;

    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.error.unwrap().contains("empty response"));
}
