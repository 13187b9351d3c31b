//! Read-only queries over the collection: list filters and the dashboard
//! summary. Day boundaries are UTC midnights.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::models::{Priority, Task, TaskStatus};

/// Days ahead counted as upcoming on the dashboard.
pub const UPCOMING_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueFilter {
    /// Due before the start of today.
    Overdue,
    Today,
    /// Due from the start of today through the next seven days.
    ThisWeek,
    NoDueDate,
}

impl DueFilter {
    pub const ALL: [DueFilter; 4] = [Self::Overdue, Self::Today, Self::ThisWeek, Self::NoDueDate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::ThisWeek => "thisWeek",
            Self::NoDueDate => "noDueDate",
        }
    }

    /// Case and separators are ignored, so `this-week` and `no_due_date` work.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "overdue" => Some(Self::Overdue),
            "today" => Some(Self::Today),
            "thisweek" | "week" => Some(Self::ThisWeek),
            "noduedate" | "none" => Some(Self::NoDueDate),
            _ => None,
        }
    }

    pub fn matches(&self, due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let today = start_of_day(now);
        match (self, due) {
            (Self::NoDueDate, due) => due.is_none(),
            (_, None) => false,
            (Self::Overdue, Some(due)) => due < today,
            (Self::Today, Some(due)) => due >= today && due < today + Duration::days(1),
            (Self::ThisWeek, Some(due)) => due >= today && due < today + Duration::days(7),
        }
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Criteria for `list`. Every set criterion must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
    /// Empty means any priority.
    pub priorities: Vec<Priority>,
    pub due: Option<DueFilter>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(term) = self.search.as_deref() {
            let term = term.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&term);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            if !in_title && !in_description {
                return false;
            }
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        self.due.map_or(true, |f| f.matches(task.due_date, now))
    }
}

/// Dashboard figures over the visible (non-archived) tasks.
#[derive(Debug)]
pub struct Dashboard<'a> {
    pub total: usize,
    pub completed: usize,
    /// Due before `now`, in collection order.
    pub overdue: Vec<&'a Task>,
    /// Due within the next [`UPCOMING_DAYS`], soonest first.
    pub upcoming: Vec<&'a Task>,
}

pub fn dashboard(tasks: &[Task], now: DateTime<Utc>) -> Dashboard<'_> {
    let visible: Vec<&Task> = tasks.iter().filter(|t| t.status.is_visible()).collect();
    let horizon = now + Duration::days(UPCOMING_DAYS);

    let overdue = visible
        .iter()
        .copied()
        .filter(|t| t.due_date.is_some_and(|d| d < now))
        .collect();
    let mut upcoming: Vec<&Task> = visible
        .iter()
        .copied()
        .filter(|t| t.due_date.is_some_and(|d| d >= now && d <= horizon))
        .collect();
    upcoming.sort_by_key(|t| t.due_date);

    Dashboard {
        total: visible.len(),
        completed: visible.iter().filter(|t| t.status == TaskStatus::Done).count(),
        overdue,
        upcoming,
    }
}
