use crate::board::Dashboard;
use crate::models::{format_timestamp, Priority, Task, TaskStatus};
use crate::store::StorageInfo;

fn short_id(id: &str) -> &str {
    id.get(..std::cmp::min(8, id.len())).unwrap_or(id)
}

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    println!("  Status: {}", t.status.as_str());
    println!("  Priority: {}", t.priority.as_str());
    if let Some(ref due) = t.due_date {
        println!("  Due: {}", format_timestamp(due));
    }
    println!("  Created: {}", format_timestamp(&t.created_at));
}

pub fn print_task_list(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        let due = t
            .due_date
            .map(|d| format!(" due={}", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        println!(
            "  [{}] {} ({}) p={}{}",
            t.status.as_str(),
            t.title,
            short_id(&t.id),
            t.priority.as_str(),
            due
        );
    }
}

pub fn print_counts(status: &[(TaskStatus, usize)], priority: &[(Priority, usize)]) {
    let total: usize = status.iter().map(|(_, n)| n).sum();
    println!("Tasks: {total}");
    for (s, n) in status {
        println!("  {:<12} {n}", s.as_str());
    }
    println!("Priority:");
    for (p, n) in priority {
        println!("  {:<12} {n}", p.as_str());
    }
}

pub fn print_dashboard(d: &Dashboard<'_>) {
    println!("Completed: {} of {}", d.completed, d.total);
    println!("Overdue ({}):", d.overdue.len());
    print_due_lines(&d.overdue);
    println!("Upcoming ({}):", d.upcoming.len());
    print_due_lines(&d.upcoming);
}

fn print_due_lines(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("  none");
    }
    for t in tasks {
        if let Some(due) = t.due_date {
            println!("  {} {} ({})", due.format("%Y-%m-%d"), t.title, short_id(&t.id));
        }
    }
}

pub fn print_storage_info(info: &StorageInfo, data_size: &str) {
    println!("Data size: {data_size}");
    println!("  Backups: {}", info.backup_count);
    println!("  Fallback cache entries: {}", info.cache_entries);
    println!("  Has data: {}", if info.has_data { "yes" } else { "no" });
}
