//! Storage connector for the `tasks` table.
//!
//! Each method issues exactly one fixed, positionally bound statement.

mod memory;
mod mysql;

pub use memory::MemoryTaskStore;
pub use mysql::MySqlTaskStore;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use shared::TaskRow;

use crate::error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Shared handle injected into the router as state.
pub type SharedStore = Arc<dyn TaskStore>;

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// `SELECT id, title, is_completed FROM tasks`
    async fn list(&self) -> Result<Vec<TaskRow>>;

    /// `SELECT id, title, is_completed FROM tasks WHERE id = ?`
    async fn get(&self, id: i64) -> Result<Option<TaskRow>>;

    /// `INSERT INTO tasks (title, is_completed) VALUES (?, ?)`
    async fn insert(&self, title: Option<&str>, is_completed: i64) -> Result<WriteOutcome>;

    /// `UPDATE tasks SET title = ?, is_completed = ? WHERE id = ?`, returning rows affected.
    async fn update(&self, id: i64, title: Option<&str>, is_completed: i64) -> Result<u64>;

    /// `DELETE FROM tasks WHERE id = ?`, returning rows affected.
    async fn delete(&self, id: i64) -> Result<u64>;
}

/// Runs a store call on its own task so it completes even if the request that
/// issued it is dropped. The caller's result is discarded in that case.
pub async fn detached<T, F>(call: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(call)
        .await
        .map_err(|e| StorageError::new(format!("storage task failed: {e}")))?
}
