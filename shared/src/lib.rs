use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A task as stored in the `tasks` table, with the completion flag kept as
/// the integer the column holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: i64,
    pub title: Option<String>,
    pub is_completed: i64,
}

/// A task as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: Option<String>,
    pub is_completed: bool,
}

/// Body accepted by the create and update routes.
///
/// Both fields are optional and may be any JSON value. `title` is stored in
/// its text form and `is_completed` is coerced to the stored flag with
/// [`is_truthy`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub is_completed: Option<Value>,
}

/// Echo returned after a successful create or update. `title` and
/// `is_completed` are the values the client sent, not what was stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEcho {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<Value>,
}

impl Task {
    /// Shapes a stored row for output. Only a stored `1` reads as completed.
    pub fn from_row(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            is_completed: row.is_completed == 1,
        }
    }
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task::from_row(row)
    }
}

impl TaskPayload {
    /// Reads a request body the way a lenient JSON body parser would: an
    /// empty body, malformed JSON or a non-object all count as `{}`.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The text bound to the `title` column. Numbers keep their JSON text,
    /// booleans become `1`/`0` as in a MySQL text column, arrays and objects
    /// are stored as JSON, and `null` binds as SQL NULL.
    pub fn title_text(&self) -> Option<String> {
        match self.title.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// The value written to the `is_completed` column: 1 for truthy input,
    /// 0 otherwise.
    pub fn completion_flag(&self) -> i64 {
        match &self.is_completed {
            Some(value) if is_truthy(value) => 1,
            _ => 0,
        }
    }

    pub fn echo(self, id: i64) -> TaskEcho {
        TaskEcho {
            id,
            title: self.title,
            is_completed: self.is_completed,
        }
    }
}

/// Loose truthiness: `null`, `false`, `0`, `-0` and the empty string are
/// falsy, everything else (including `"0"`, `[]` and `{}`) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
