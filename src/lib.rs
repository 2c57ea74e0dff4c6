//! Multi-agent code generation service
//!
//! Accepts natural-language programming requirements over HTTP and runs them
//! through a fixed pipeline of LLM-backed agents: requirements analysis, code
//! generation, review, optimization and test generation. Each submission
//! becomes a task whose status callers poll until it is `completed` or
//! `failed`.
//!
//! # Quick Start
//!
//! ```rust
//! use codegen_agents::agents::GenerationRequest;
//! use codegen_agents::tasks::{InMemoryTaskStore, TaskService};
//! use codegen_agents::testing::MockPipelineAgents;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let service = TaskService::new(
//!     Arc::new(InMemoryTaskStore::new()),
//!     Arc::new(MockPipelineAgents::new()),
//!     false,
//! );
//!
//! let id = service
//!     .submit(GenerationRequest::new("add two numbers"))
//!     .await
//!     .unwrap();
//! let record = service.status_of(&id.to_string()).await.unwrap();
//! assert_eq!(record.id, id);
//! # });
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod server;
pub mod tasks;
pub mod testing;

pub use agents::{GenerationRequest, PipelineAgents, PipelineOutput, Stage};
pub use config::*;
pub use error::{AppError, AppResult};
pub use server::{ApiServer, AppState};
pub use tasks::{InMemoryTaskStore, TaskRecord, TaskService, TaskStatus, TaskStore};
