use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::TaskRow;

use super::{Result, TaskStore, WriteOutcome};
use crate::error::StorageError;

/// In-memory stand-in for the `tasks` table.
///
/// Rows come back in id order and ids are assigned ascending from 1, like an
/// auto-increment key. A failure can be injected to exercise error paths.
#[derive(Debug)]
pub struct MemoryTaskStore {
    rows: Mutex<BTreeMap<i64, TaskRow>>,
    next_id: AtomicI64,
    failure: Mutex<Option<StorageError>>,
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Seeds the table with raw rows, e.g. flags other than 0 and 1.
    pub fn with_rows(rows: Vec<TaskRow>) -> Self {
        let max_id = rows.iter().map(|row| row.id).max().unwrap_or(0);
        Self {
            rows: Mutex::new(rows.into_iter().map(|row| (row.id, row)).collect()),
            next_id: AtomicI64::new(max_id + 1),
            failure: Mutex::new(None),
        }
    }

    /// Makes every subsequent call fail with `message` until cleared.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(StorageError::new(message));
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Reads a stored row directly, bypassing injected failures.
    pub fn row(&self, id: i64) -> Option<TaskRow> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self) -> Result<Vec<TaskRow>> {
        self.check_failure()?;
        Ok(self.rows.lock().values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<TaskRow>> {
        self.check_failure()?;
        Ok(self.row(id))
    }

    async fn insert(&self, title: Option<&str>, is_completed: i64) -> Result<WriteOutcome> {
        self.check_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().insert(
            id,
            TaskRow {
                id,
                title: title.map(str::to_owned),
                is_completed,
            },
        );

        Ok(WriteOutcome {
            rows_affected: 1,
            last_insert_id: id as u64,
        })
    }

    async fn update(&self, id: i64, title: Option<&str>, is_completed: i64) -> Result<u64> {
        self.check_failure()?;
        let mut rows = self.rows.lock();
        match rows.get_mut(&id) {
            Some(row) => {
                row.title = title.map(str::to_owned);
                row.is_completed = is_completed;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        self.check_failure()?;
        Ok(self.rows.lock().remove(&id).map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_continue_after_seeded_rows() {
        let store = MemoryTaskStore::with_rows(vec![TaskRow {
            id: 41,
            title: Some("seeded".into()),
            is_completed: 0,
        }]);

        let outcome = store.insert(Some("next"), 1).await.unwrap();
        assert_eq!(outcome.last_insert_id, 42);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn injected_failure_applies_until_cleared() {
        let store = MemoryTaskStore::new();
        store.fail_with("boom");
        assert_eq!(store.list().await.unwrap_err().message(), "boom");

        store.clear_failure();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_to_missing_ids_affect_nothing() {
        let store = MemoryTaskStore::new();
        assert_eq!(store.update(9, Some("x"), 1).await.unwrap(), 0);
        assert_eq!(store.delete(9).await.unwrap(), 0);
        assert!(store.is_empty());
    }
}
