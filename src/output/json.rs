use serde_json::{json, Value};

use crate::board::Dashboard;
use crate::error::TaskboardError;
use crate::models::{format_timestamp, Priority, Task, TaskStatus};
use crate::store::StorageInfo;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &TaskboardError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn task_summary(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "status": t.status.as_str(),
        "priority": t.priority.as_str()
    })
}

pub fn task_detail(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": t.description,
        "status": t.status.as_str(),
        "priority": t.priority.as_str(),
        "due_date": t.due_date.as_ref().map(format_timestamp),
        "created_at": format_timestamp(&t.created_at)
    })
}

pub fn counts_json(status: &[(TaskStatus, usize)], priority: &[(Priority, usize)]) -> Value {
    let mut by_status = serde_json::Map::new();
    for (s, n) in status {
        by_status.insert(s.as_str().to_string(), json!(n));
    }
    let mut by_priority = serde_json::Map::new();
    for (p, n) in priority {
        by_priority.insert(p.as_str().to_string(), json!(n));
    }
    json!({
        "total": status.iter().map(|(_, n)| n).sum::<usize>(),
        "by_status": by_status,
        "by_priority": by_priority
    })
}

pub fn dashboard_json(d: &Dashboard<'_>) -> Value {
    json!({
        "total": d.total,
        "completed": d.completed,
        "overdue_count": d.overdue.len(),
        "overdue": d.overdue.iter().map(|t| task_detail(t)).collect::<Vec<_>>(),
        "upcoming": d.upcoming.iter().map(|t| task_detail(t)).collect::<Vec<_>>()
    })
}

pub fn storage_json(info: &StorageInfo, data_size: &str) -> Value {
    json!({
        "data_size": data_size,
        "primary_size": info.primary_size,
        "cache_entries": info.cache_entries,
        "backup_count": info.backup_count,
        "has_data": info.has_data
    })
}

pub fn render(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}
