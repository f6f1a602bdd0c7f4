use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use shared::{Task, TaskEcho, TaskPayload};

use crate::error::{ApiError, StorageError};
use crate::store::{detached, SharedStore, WriteOutcome};

pub const GREETING: &str = "Todo list home page";
pub const DELETED_MESSAGE: &str = "Task deleted successfully";

/// Leading numeric prefix MySQL reads when a string is compared to an integer.
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap()
});

/// Reads an id segment the way MySQL coerces a string compared with the
/// integer `id` column: `5abc` and `5.0` mean 5, no numeric prefix means 0.
/// A value that is not a whole number cannot match any row.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    let value = match NUMERIC_PREFIX.find(raw) {
        Some(prefix) => prefix
            .as_str()
            .trim()
            .parse::<f64>()
            .map_err(|_| ApiError::NotFound)?,
        None => 0.0,
    };

    if value.fract() != 0.0 || value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(ApiError::NotFound);
    }
    Ok(value as i64)
}

/// Bodies are only read as JSON when the request says so; anything else is
/// treated as an empty object.
fn read_payload(headers: &HeaderMap, body: &[u8]) -> TaskPayload {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"));

    if is_json {
        TaskPayload::from_body(body)
    } else {
        TaskPayload::default()
    }
}

fn generated_id(outcome: WriteOutcome) -> Result<i64, StorageError> {
    i64::try_from(outcome.last_insert_id).map_err(|_| {
        StorageError::new(format!(
            "generated id {} does not fit a signed 64-bit integer",
            outcome.last_insert_id
        ))
    })
}

pub async fn home() -> &'static str {
    GREETING
}

pub async fn list_tasks(State(store): State<SharedStore>) -> Result<Json<Vec<Task>>, ApiError> {
    let rows = detached(async move { store.list().await }).await?;
    Ok(Json(rows.into_iter().map(Task::from).collect()))
}

pub async fn get_task(
    Path(id): Path<String>,
    State(store): State<SharedStore>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let row = detached(async move { store.get(id).await })
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(Task::from(row)))
}

pub async fn create_task(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TaskEcho>, ApiError> {
    let payload = read_payload(&headers, &body);
    let title = payload.title_text();
    let flag = payload.completion_flag();

    let outcome = detached(async move { store.insert(title.as_deref(), flag).await }).await?;
    let id = generated_id(outcome)?;
    tracing::debug!(id, "task created");

    Ok(Json(payload.echo(id)))
}

pub async fn update_task(
    Path(id): Path<String>,
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TaskEcho>, ApiError> {
    let id = parse_id(&id)?;
    let payload = read_payload(&headers, &body);
    let title = payload.title_text();
    let flag = payload.completion_flag();

    let affected = detached(async move { store.update(id, title.as_deref(), flag).await }).await?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(payload.echo(id)))
}

pub async fn delete_task(
    Path(id): Path<String>,
    State(store): State<SharedStore>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let affected = detached(async move { store.delete(id).await }).await?;

    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    tracing::debug!(id, "task deleted");
    Ok(Json(json!({ "message": DELETED_MESSAGE })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_of(raw: &str) -> Option<i64> {
        parse_id(raw).ok()
    }

    #[test]
    fn ids_are_coerced_like_mysql_string_comparison() {
        assert_eq!(id_of("5"), Some(5));
        assert_eq!(id_of("5abc"), Some(5));
        assert_eq!(id_of("5.0"), Some(5));
        assert_eq!(id_of(" 7"), Some(7));
        assert_eq!(id_of("5e1"), Some(50));
        assert_eq!(id_of("-3"), Some(-3));
        assert_eq!(id_of("abc"), Some(0));
        assert_eq!(id_of(""), Some(0));
    }

    #[test]
    fn only_json_content_types_are_parsed() {
        let body = br#"{"title":"x","is_completed":true}"#;
        let mut headers = HeaderMap::new();
        assert_eq!(read_payload(&headers, body).completion_flag(), 0);

        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert_eq!(read_payload(&headers, body).completion_flag(), 0);

        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert_eq!(read_payload(&headers, body).completion_flag(), 1);

        headers.insert(CONTENT_TYPE, "application/merge-patch+json".parse().unwrap());
        assert_eq!(read_payload(&headers, body).title_text().as_deref(), Some("x"));
    }

    #[test]
    fn generated_ids_beyond_i64_are_storage_errors() {
        let outcome = |last_insert_id| WriteOutcome {
            rows_affected: 1,
            last_insert_id,
        };
        assert_eq!(generated_id(outcome(42)), Ok(42));
        assert_eq!(generated_id(outcome(i64::MAX as u64)), Ok(i64::MAX));

        let error = generated_id(outcome(u64::MAX)).unwrap_err();
        assert!(error.message().contains("does not fit"));
    }

    #[test]
    fn fractional_or_huge_ids_match_nothing() {
        assert_eq!(id_of("5.5"), None);
        assert_eq!(id_of("1e30"), None);
    }
}
