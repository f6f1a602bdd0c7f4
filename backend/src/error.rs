use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Task not found";

/// Any failure coming out of the database layer. Carries the driver's message
/// as-is; it is handed back to the client unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StorageError(pub String);

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            // Prefer the server's own text over sqlx's "error returned from database: ..." wrapper.
            sqlx::Error::Database(db) => Self(db.message().to_string()),
            other => Self(other.to_string()),
        }
    }
}

/// Everything a route handler can fail with.
///
/// Both variants answer with status 200; clients tell them apart by body
/// shape (`{"error": ..}` vs `{"message": ..}`).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Task not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Storage(error) => {
                tracing::warn!(error = %error, "storage call failed");
                Json(json!({ "error": error.message() })).into_response()
            }
            ApiError::NotFound => Json(json!({ "message": NOT_FOUND_MESSAGE })).into_response(),
        }
    }
}
