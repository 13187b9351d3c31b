//! Wire encoding of the task collection.
//!
//! Encoding is strict. Decoding is lenient per record: a malformed field
//! falls back to a safe default instead of rejecting the whole collection.
//! Only a payload that is not a JSON array is rejected.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::TaskboardError;
use crate::models::{parse_timestamp, Priority, Task, TaskStatus};

pub const UNTITLED: &str = "Untitled task";

pub fn encode_tasks(tasks: &[Task]) -> Result<String, TaskboardError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Decode a stored payload. `now` stands in for unreadable creation times.
pub fn decode_tasks(raw: &str, now: DateTime<Utc>) -> Result<Vec<Task>, TaskboardError> {
    let value: Value = serde_json::from_str(raw)?;
    decode_value(&value, now)
}

pub fn decode_value(value: &Value, now: DateTime<Utc>) -> Result<Vec<Task>, TaskboardError> {
    let Value::Array(items) = value else {
        return Err(TaskboardError::malformed("stored tasks are not an array"));
    };
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            warn!(index, "skipping stored task that is not an object");
            continue;
        };
        let mut task = decode_record(fields, index, now);
        if !seen.insert(task.id.clone()) {
            let fresh = ulid::Ulid::new().to_string();
            warn!(index, old = %task.id, new = %fresh, "re-keying duplicate task id");
            task.id = fresh;
            seen.insert(task.id.clone());
        }
        tasks.push(task);
    }
    Ok(tasks)
}

fn decode_record(fields: &Map<String, Value>, index: usize, now: DateTime<Utc>) -> Task {
    let id = match fields.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        // Numeric ids are kept as their decimal form.
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            warn!(index, "stored task has no usable id, assigning one");
            ulid::Ulid::new().to_string()
        }
    };

    let title = match fields.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => {
            warn!(%id, "stored task has no usable title");
            UNTITLED.to_string()
        }
    };

    let description = match fields.get("description") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            warn!(%id, "dropping non-text description");
            None
        }
    };

    let status = match fields.get("status").and_then(Value::as_str) {
        Some(s) => TaskStatus::parse(s).unwrap_or_else(|| {
            warn!(%id, status = s, "unrecognized status, using To Do");
            TaskStatus::ToDo
        }),
        None => TaskStatus::ToDo,
    };

    let priority = match fields.get("priority").and_then(Value::as_str) {
        Some(s) => Priority::parse(s).unwrap_or_else(|| {
            warn!(%id, priority = s, "unrecognized priority, using Medium");
            Priority::Medium
        }),
        None => Priority::Medium,
    };

    let due_date = match fields.get("dueDate") {
        Some(Value::String(s)) => {
            let parsed = parse_timestamp(s);
            if parsed.is_none() {
                warn!(%id, due = %s, "unparsable due date dropped");
            }
            parsed
        }
        Some(Value::Null) | None => None,
        Some(_) => {
            warn!(%id, "non-text due date dropped");
            None
        }
    };

    let created_at = match fields.get("createdAt").and_then(Value::as_str).and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            warn!(%id, "unreadable creation time, using load time");
            now
        }
    };

    Task {
        id,
        title,
        description,
        status,
        priority,
        due_date,
        created_at,
    }
}
