use chrono::{DateTime, Duration, Utc};

use super::{Priority, Task, TaskStatus};

struct Seed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: Priority,
    due_in_days: i64,
    created_days_ago: i64,
}

const SEEDS: [Seed; 8] = [
    Seed {
        id: "1",
        title: "Complete project documentation",
        description: "Write comprehensive documentation for the task board",
        status: TaskStatus::ToDo,
        priority: Priority::High,
        due_in_days: 3,
        created_days_ago: 2,
    },
    Seed {
        id: "2",
        title: "Implement drag and drop",
        description: "Add smooth drag and drop between board columns",
        status: TaskStatus::InProgress,
        priority: Priority::Medium,
        due_in_days: 1,
        created_days_ago: 1,
    },
    Seed {
        id: "3",
        title: "Design user interface",
        description: "Create a modern and responsive board layout",
        status: TaskStatus::Done,
        priority: Priority::Low,
        due_in_days: -1,
        created_days_ago: 3,
    },
    Seed {
        id: "4",
        title: "Set up Firebase integration",
        description: "Configure Firestore database and real-time updates",
        status: TaskStatus::ToDo,
        priority: Priority::High,
        due_in_days: 5,
        created_days_ago: 1,
    },
    Seed {
        id: "5",
        title: "Add search and filtering",
        description: "Implement advanced search and filter functionality",
        status: TaskStatus::ToDo,
        priority: Priority::Medium,
        due_in_days: 2,
        created_days_ago: 1,
    },
    Seed {
        id: "6",
        title: "Create dashboard analytics",
        description: "Build charts and statistics for task overview",
        status: TaskStatus::InProgress,
        priority: Priority::Medium,
        due_in_days: 1,
        created_days_ago: 2,
    },
    Seed {
        id: "7",
        title: "Test responsive design",
        description: "Ensure the board works on mobile and tablet",
        status: TaskStatus::Done,
        priority: Priority::Low,
        due_in_days: -2,
        created_days_ago: 4,
    },
    Seed {
        id: "8",
        title: "Optimize performance",
        description: "Improve loading times and reduce bundle size",
        status: TaskStatus::Done,
        priority: Priority::High,
        due_in_days: -1,
        created_days_ago: 3,
    },
];

/// Tasks shown on first run, dated relative to `now`.
pub fn default_tasks(now: DateTime<Utc>) -> Vec<Task> {
    SEEDS
        .iter()
        .map(|s| Task {
            id: s.id.to_string(),
            title: s.title.to_string(),
            description: Some(s.description.to_string()),
            status: s.status,
            priority: s.priority,
            due_date: Some(now + Duration::days(s.due_in_days)),
            created_at: now - Duration::days(s.created_days_ago),
        })
        .collect()
}
