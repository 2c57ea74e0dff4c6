//! Task lifecycle: records, storage, orchestration and the service facade

pub mod orchestrator;
pub mod record;
pub mod service;
pub mod store;

pub use orchestrator::TaskOrchestrator;
pub use record::{TaskRecord, TaskStatus, Transition};
pub use service::TaskService;
pub use store::{InMemoryTaskStore, TaskStore};
