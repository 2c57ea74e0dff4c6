//! warp filter tree for the HTTP API

use super::handlers;
use super::rejection::handle_rejection;
use super::AppState;
use crate::agents::GenerationRequest;
use std::convert::Infallible;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::{Filter, Rejection, Reply};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Complete route tree with CORS, error recovery and request logging
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    let request_log = warp::log::custom(|info| {
        info!(
            method = %info.method(),
            path = info.path(),
            status = info.status().as_u16(),
            elapsed_ms = info.elapsed().as_millis() as u64,
            "HTTP request"
        );
    });

    api_routes(state.clone())
        .or(service_routes())
        .or(static_files(state.config.server.static_dir.clone()))
        .with(cors)
        .recover(handle_rejection)
        .with(request_log)
}

/// Everything under `/api/v1`
pub fn api_routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let submit = warp::path!("api" / "v1" / "generate-code")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<GenerationRequest>())
        .and(with_state(state.clone()))
        .and_then(handlers::submit_generation);

    let status = warp::path!("api" / "v1" / "code-status" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::code_status);

    let agents = warp::path!("api" / "v1" / "agents")
        .and(warp::get())
        .map(handlers::list_agents);

    let config = warp::path!("api" / "v1" / "config")
        .and(warp::get())
        .and(with_state(state))
        .map(handlers::show_config);

    let health = warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .map(handlers::health);

    let info = warp::path!("api" / "v1")
        .and(warp::get())
        .map(handlers::api_info);

    submit
        .or(status)
        .or(agents)
        .or(config)
        .or(health)
        .or(info)
}

/// Root info, liveness and metrics
fn service_routes() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let root = warp::path::end().and(warp::get()).map(handlers::root_info);
    let health = warp::path!("health").and(warp::get()).map(handlers::health);
    let metrics = warp::path!("metrics")
        .and(warp::get())
        .map(handlers::metrics_snapshot);

    root.or(health).or(metrics)
}

/// Files under `/static`, when a directory is configured
fn static_files(dir: Option<String>) -> BoxedFilter<(warp::fs::File,)> {
    match dir {
        Some(dir) => warp::path("static")
            .and(warp::get())
            .and(warp::fs::dir(dir))
            .boxed(),
        None => warp::path("static")
            .and_then(|| async { Err::<warp::fs::File, Rejection>(warp::reject::not_found()) })
            .boxed(),
    }
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::tasks::{InMemoryTaskStore, TaskService};
    use crate::testing::MockPipelineAgents;
    use std::sync::Arc;
    use warp::http::StatusCode;

    fn state() -> AppState {
        let service = TaskService::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(MockPipelineAgents::new()),
            false,
        );
        AppState::new(Arc::new(service), Arc::new(AppConfig::default()))
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let response = warp::test::request()
            .method("GET")
            .path("/api/v1/generate-code")
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = warp::test::request()
            .path("/api/v1/unknown")
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["detail"], "Not Found");
    }

    #[tokio::test]
    async fn test_static_disabled_by_default() {
        let response = warp::test::request()
            .path("/static/index.html")
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let requirements = "x".repeat(MAX_BODY_BYTES as usize + 1);
        let response = warp::test::request()
            .method("POST")
            .path("/api/v1/generate-code")
            .header("content-type", "application/json")
            .json(&serde_json::json!({ "requirements": requirements }))
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let response = warp::test::request()
            .path("/health")
            .header("origin", "http://localhost:3000")
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
