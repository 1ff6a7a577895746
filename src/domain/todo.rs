//! Todo records and the payloads of their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A row of the `todos` table. `completed` goes out as the store's 0/1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    #[serde(serialize_with = "serialize_flag")]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

fn serialize_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Fields written by the create operation. `id` and `created_at` come from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub task: String,
    pub completed: bool,
}

impl NewTodo {
    /// Returns `None` when the task is absent or empty.
    pub fn from_task(task: Option<String>) -> Option<Self> {
        task.filter(|t| !t.is_empty()).map(|task| NewTodo {
            task,
            completed: false,
        })
    }
}

/// Body of a 201 response: the assigned id plus the submitted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTodo {
    pub id: i64,
    pub task: String,
    pub completed: bool,
}

impl CreatedTodo {
    pub fn new(id: i64, todo: NewTodo) -> Self {
        CreatedTodo {
            id,
            task: todo.task,
            completed: todo.completed,
        }
    }
}

/// Normalize a `completed` field from a request body.
///
/// | input                 | result |
/// |-----------------------|--------|
/// | `true`                | true   |
/// | `"true"`              | true   |
/// | anything else, absent | false  |
pub fn parse_completed(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}
