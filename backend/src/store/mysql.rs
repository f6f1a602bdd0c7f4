use async_trait::async_trait;
use shared::TaskRow;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlRow},
    Connection, MySqlConnection, Row,
};
use tokio::sync::Mutex;

use super::{Result, TaskStore, WriteOutcome};
use crate::{config::DatabaseConfig, error::StorageError};

const SELECT_ALL: &str = "SELECT id, title, is_completed FROM tasks";
const SELECT_ONE: &str = "SELECT id, title, is_completed FROM tasks WHERE id = ?";
const INSERT: &str = "INSERT INTO tasks (title, is_completed) VALUES (?, ?)";
const UPDATE: &str = "UPDATE tasks SET title = ?, is_completed = ? WHERE id = ?";
const DELETE: &str = "DELETE FROM tasks WHERE id = ?";

/// MySQL-backed store holding a single connection for the whole process.
///
/// Statements from concurrent requests queue on the connection mutex. If the
/// initial connect failed, every call fails with that reason; the store never
/// reconnects.
#[derive(Debug)]
pub struct MySqlTaskStore {
    conn: Mutex<std::result::Result<MySqlConnection, StorageError>>,
}

impl MySqlTaskStore {
    /// Opens the connection described by `config`. A failed connect is logged
    /// and leaves the store disconnected rather than returning an error.
    pub async fn connect(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let conn = match MySqlConnection::connect_with(&options).await {
            Ok(conn) => {
                tracing::info!(host = %config.host, database = %config.name, "Connected to database");
                Ok(conn)
            }
            Err(e) => {
                let error = StorageError::from(e);
                tracing::error!(
                    host = %config.host,
                    database = %config.name,
                    error = %error,
                    "Error connecting to database"
                );
                Err(StorageError::new(format!(
                    "database connection is not available: {error}"
                )))
            }
        };

        Self {
            conn: Mutex::new(conn),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_ok()
    }
}

fn row_to_task(row: &MySqlRow) -> Result<TaskRow> {
    Ok(TaskRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        is_completed: row.try_get("is_completed")?,
    })
}

#[async_trait]
impl TaskStore for MySqlTaskStore {
    async fn list(&self) -> Result<Vec<TaskRow>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().map_err(|e| e.clone())?;

        let rows = sqlx::query(SELECT_ALL).fetch_all(&mut *conn).await?;
        rows.iter().map(row_to_task).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<TaskRow>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().map_err(|e| e.clone())?;

        let row = sqlx::query(SELECT_ONE)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    async fn insert(&self, title: Option<&str>, is_completed: i64) -> Result<WriteOutcome> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().map_err(|e| e.clone())?;

        let result = sqlx::query(INSERT)
            .bind(title)
            .bind(is_completed)
            .execute(&mut *conn)
            .await?;

        Ok(WriteOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn update(&self, id: i64, title: Option<&str>, is_completed: i64) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().map_err(|e| e.clone())?;

        let result = sqlx::query(UPDATE)
            .bind(title)
            .bind(is_completed)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().map_err(|e| e.clone())?;

        let result = sqlx::query(DELETE).bind(id).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            // Nothing listens on port 1; the connect is refused.
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DatabaseConfig::default()
        }
    }

    #[tokio::test]
    async fn failed_connect_yields_a_store_that_fails_every_call() {
        let store = MySqlTaskStore::connect(&unreachable_config()).await;
        assert!(!store.is_connected().await);

        let list = store.list().await.unwrap_err();
        assert!(list.message().starts_with("database connection is not available"));

        assert!(store.get(1).await.is_err());
        assert!(store.insert(Some("x"), 0).await.is_err());
        assert!(store.update(1, Some("x"), 1).await.is_err());
        assert!(store.delete(1).await.is_err());
    }
}
