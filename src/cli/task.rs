use chrono::{DateTime, Utc};
use serde_json::json;

use crate::board::{DueFilter, TaskBoard, TaskFilter};
use crate::error::TaskboardError;
use crate::models::{now_millis, parse_timestamp, NewTask, Priority, Task, TaskPatch, TaskStatus};
use crate::output;
use crate::store::KeyValueStore;

pub struct ListArgs {
    pub archived: bool,
    pub all: bool,
    pub search: Option<String>,
    pub priorities: Vec<String>,
    pub due: Option<String>,
}

pub struct UpdateArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
}

pub fn parse_priority(s: &str) -> Result<Priority, TaskboardError> {
    Priority::parse(s).ok_or_else(|| {
        TaskboardError::validation(format!(
            "Invalid priority '{s}'. Expected one of: Low, Medium, High"
        ))
    })
}

pub fn parse_status(s: &str) -> Result<TaskStatus, TaskboardError> {
    TaskStatus::parse(s).ok_or_else(|| TaskboardError::invalid_status(s))
}

pub fn parse_due_filter(s: &str) -> Result<DueFilter, TaskboardError> {
    DueFilter::parse(s).ok_or_else(|| {
        TaskboardError::validation(format!(
            "Invalid due filter '{s}'. Expected one of: overdue, today, thisWeek, noDueDate"
        ))
    })
}

pub fn parse_due(s: &str) -> Result<DateTime<Utc>, TaskboardError> {
    parse_timestamp(s).ok_or_else(|| {
        TaskboardError::validation(format!(
            "Invalid due date '{s}'. Use YYYY-MM-DD or an RFC 3339 timestamp"
        ))
    })
}

/// Warn when the last save only reached the in-memory fallback.
fn note_save<S: KeyValueStore>(board: &TaskBoard<S>, json_output: bool) -> bool {
    let durable = board.last_save().map_or(true, |o| o.is_durable());
    if !durable && !json_output {
        eprintln!("Warning: storage is unavailable; changes are kept in memory for this session only.");
    }
    durable
}

pub fn run_add<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    title: String,
    description: Option<String>,
    priority: &str,
    status: Option<&str>,
    due: Option<&str>,
    json_output: bool,
) -> Result<(), TaskboardError> {
    // Parse everything before touching the board.
    let mut data = NewTask::new(title).priority(parse_priority(priority)?);
    if let Some(status) = status {
        data = data.status(parse_status(status)?);
    }
    if let Some(due) = due {
        data = data.due(parse_due(due)?);
    }
    data.description = description;

    let id = board.create(data)?;
    let durable = note_save(board, json_output);
    let task = board.get(&id).ok_or_else(|| TaskboardError::task_not_found(&id))?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_summary(task),
                "durable": durable
            })))
        );
    } else {
        println!("Added task: {} ({})", task.title, task.id);
    }
    Ok(())
}

pub fn run_list<S: KeyValueStore>(
    board: &TaskBoard<S>,
    args: ListArgs,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let filter = TaskFilter {
        search: args.search.filter(|s| !s.trim().is_empty()),
        priorities: args
            .priorities
            .iter()
            .map(|p| parse_priority(p))
            .collect::<Result<_, _>>()?,
        due: args.due.as_deref().map(parse_due_filter).transpose()?,
    };
    let now = now_millis();
    let tasks: Vec<&Task> = board
        .tasks()
        .iter()
        .filter(|t| args.all || (t.status == TaskStatus::Archived) == args.archived)
        .filter(|t| filter.matches(t, now))
        .collect();

    if json_output {
        let tasks_json: Vec<_> = tasks.iter().map(|t| output::json::task_detail(t)).collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "tasks": tasks_json,
                "total": tasks.len()
            })))
        );
    } else {
        output::text::print_task_list(&tasks);
    }
    Ok(())
}

pub fn run_show<S: KeyValueStore>(
    board: &TaskBoard<S>,
    id: &str,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let task = board.get(id).ok_or_else(|| TaskboardError::task_not_found(id))?;
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(task)
            })))
        );
    } else {
        output::text::print_task(task);
    }
    Ok(())
}

pub fn run_update<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    id: &str,
    args: UpdateArgs,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let patch = TaskPatch {
        title: args.title,
        description: if args.clear_description {
            Some(None)
        } else {
            args.description.map(Some)
        },
        status: args.status.as_deref().map(parse_status).transpose()?,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        due_date: if args.clear_due {
            Some(None)
        } else {
            args.due.as_deref().map(parse_due).transpose()?.map(Some)
        },
    };
    if patch.is_empty() {
        return Err(TaskboardError::validation("Nothing to update"));
    }

    let found = board.update(id, patch)?;
    let durable = note_save(board, json_output);
    print_change(board, id, found, durable, json_output, "Updated");
    Ok(())
}

pub fn run_move<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    id: &str,
    status: &str,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let found = board.move_task_named(id, status)?;
    let durable = note_save(board, json_output);
    print_change(board, id, found, durable, json_output, "Moved");
    Ok(())
}

pub fn run_delete<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    id: &str,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let found = board.delete(id);
    let durable = note_save(board, json_output);
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "id": id,
                "deleted": found,
                "durable": durable
            })))
        );
    } else if found {
        println!("Deleted task {id}");
    } else {
        println!("No task with id {id}; nothing changed.");
    }
    Ok(())
}

pub fn run_archive<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    ids: &[String],
    json_output: bool,
) -> Result<(), TaskboardError> {
    let archived = board.bulk_archive(ids);
    let durable = note_save(board, json_output);
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "requested": ids.len(),
                "archived": archived,
                "durable": durable
            })))
        );
    } else {
        println!("Archived {archived} of {} task(s)", ids.len());
    }
    Ok(())
}

fn print_change<S: KeyValueStore>(
    board: &TaskBoard<S>,
    id: &str,
    found: bool,
    durable: bool,
    json_output: bool,
    verb: &str,
) {
    match (board.get(id), json_output) {
        (Some(task), true) => println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_summary(task),
                "changed": found,
                "durable": durable
            })))
        ),
        (None, true) => println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "id": id,
                "changed": false,
                "durable": durable
            })))
        ),
        (Some(task), false) => println!("{verb} task {} → [{}] {}", task.id, task.status.as_str(), task.title),
        (None, false) => println!("No task with id {id}; nothing changed."),
    }
}
