//! Task record storage
//!
//! [`TaskStore`] is the only shared mutable state in the service. The
//! in-memory implementation keeps every record for the life of the process.

use super::record::{TaskRecord, Transition};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new record; fails if the id is already taken
    async fn create(&self, record: TaskRecord) -> AppResult<()>;

    /// Snapshot of one record
    async fn get(&self, id: Uuid) -> AppResult<TaskRecord>;

    /// Apply a transition atomically and return the updated snapshot
    async fn update(&self, id: Uuid, transition: Transition) -> AppResult<TaskRecord>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Table-level RwLock around a map of records
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    records: RwLock<HashMap<Uuid, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, record: TaskRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(AppError::DuplicateTask {
                task_id: record.id.to_string(),
            });
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<TaskRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::task_not_found(id.to_string()))
    }

    async fn update(&self, id: Uuid, transition: Transition) -> AppResult<TaskRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::task_not_found(id.to_string()))?;

        record.apply(transition)?;
        Ok(record.clone())
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
