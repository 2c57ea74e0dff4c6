//! Request handlers

use super::rejection::reject;
use super::AppState;
use crate::agents::{agent_catalog, GenerationRequest};
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use warp::{Rejection, Reply};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
struct RootInfo {
    message: &'static str,
    version: &'static str,
    docs: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ConfigResponse<'a> {
    llm_provider: &'a str,
    llm_model: &'a str,
    app_env: &'a str,
    debug: bool,
}

pub async fn submit_generation(
    request: GenerationRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let task_id = state.service.submit(request).await.map_err(reject)?;

    Ok(warp::reply::json(&SubmitResponse {
        task_id: task_id.to_string(),
        message: "Code generation task started",
    }))
}

pub async fn code_status(task_id: String, state: AppState) -> Result<impl Reply, Rejection> {
    let record = state.service.status_of(&task_id).await.map_err(|e| {
        debug!(task_id = %task_id, "Status requested for unknown task");
        reject(e)
    })?;
    Ok(warp::reply::json(&record))
}

pub fn list_agents() -> impl Reply {
    warp::reply::json(&agent_catalog())
}

pub fn show_config(state: AppState) -> impl Reply {
    let config = &state.config;
    warp::reply::json(&ConfigResponse {
        llm_provider: config.llm.provider.as_str(),
        llm_model: &config.llm.model,
        app_env: &config.app.env,
        debug: config.app.debug,
    })
}

pub fn api_info() -> impl Reply {
    warp::reply::json(&ApiInfo {
        name: "Multi-Agent Code Generation API",
        version: VERSION,
        description: "API for generating, reviewing, optimizing and testing code with LLM agents",
    })
}

pub fn root_info() -> impl Reply {
    warp::reply::json(&RootInfo {
        message: "Multi-Agent Code Generation System",
        version: VERSION,
        docs: "/api/v1",
    })
}

pub fn health() -> impl Reply {
    warp::reply::json(&HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

pub fn metrics_snapshot() -> impl Reply {
    warp::reply::json(&metrics().get_metrics())
}
