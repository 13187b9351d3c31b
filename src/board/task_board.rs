use std::collections::HashSet;
use std::time::Instant;

use chrono::SubsecRound;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::TaskboardError;
use crate::models::{now_millis, NewTask, Priority, Task, TaskPatch, TaskStatus};
use crate::store::{DurableStore, KeyValueStore, SaveOutcome};

use super::scheduler::SaveScheduler;

/// Host events after which the process may not get another chance to save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Unload,
    PageHide,
    Hidden,
    FocusLost,
    FocusGained,
    Background,
    Loaded,
}

/// The session's task collection. Every mutation is persisted through the
/// owned [`DurableStore`].
pub struct TaskBoard<S: KeyValueStore> {
    store: DurableStore<S>,
    tasks: Vec<Task>,
    scheduler: SaveScheduler,
    immediate_save: bool,
    last_save: Option<SaveOutcome>,
}

impl<S: KeyValueStore> TaskBoard<S> {
    pub fn new(mut store: DurableStore<S>, config: &Config) -> Self {
        let tasks = store.load();
        debug!(count = tasks.len(), "task board loaded");
        Self {
            store,
            tasks,
            scheduler: SaveScheduler::new(config.debounce()),
            immediate_save: config.immediate_save,
            last_save: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn store(&self) -> &DurableStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DurableStore<S> {
        &mut self.store
    }

    pub fn scheduler(&self) -> &SaveScheduler {
        &self.scheduler
    }

    pub fn last_save(&self) -> Option<SaveOutcome> {
        self.last_save
    }

    /// Add a task at the front of the collection and return its id.
    pub fn create(&mut self, data: NewTask) -> Result<String, TaskboardError> {
        let title = validate_title(&data.title)?;
        let id = self.fresh_id();
        let task = Task {
            id: id.clone(),
            title,
            description: data.description,
            status: data.status.unwrap_or_default(),
            priority: data.priority,
            due_date: data.due_date.map(|d| d.trunc_subsecs(3)),
            created_at: now_millis(),
        };
        self.tasks.insert(0, task);
        info!(%id, "created task");
        self.mutated();
        Ok(id)
    }

    /// Merge `patch` into the task. Returns whether the task exists; a missing
    /// id is not an error.
    pub fn update(&mut self, id: &str, mut patch: TaskPatch) -> Result<bool, TaskboardError> {
        if let Some(title) = patch.title.as_deref() {
            patch.title = Some(validate_title(title)?);
        }
        let found = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.apply(patch);
                true
            }
            None => false,
        };
        debug!(%id, found, "update task");
        self.mutated();
        Ok(found)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let found = self.tasks.len() != before;
        debug!(%id, found, "delete task");
        self.mutated();
        found
    }

    pub fn move_task(&mut self, id: &str, status: TaskStatus) -> bool {
        let found = match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        };
        debug!(%id, status = status.as_str(), found, "move task");
        self.mutated();
        found
    }

    /// Like [`TaskBoard::move_task`] for untyped input. Unknown statuses are
    /// rejected before anything changes.
    pub fn move_task_named(&mut self, id: &str, status: &str) -> Result<bool, TaskboardError> {
        let status = TaskStatus::parse(status).ok_or_else(|| TaskboardError::invalid_status(status))?;
        Ok(self.move_task(id, status))
    }

    /// Archive every listed task. Returns how many matched.
    pub fn bulk_archive<I, T>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let ids: HashSet<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let mut archived = 0;
        for task in self.tasks.iter_mut().filter(|t| ids.contains(&t.id)) {
            task.status = TaskStatus::Archived;
            archived += 1;
        }
        info!(requested = ids.len(), archived, "bulk archive");
        self.mutated();
        archived
    }

    /// Save now, superseding any pending deferred save.
    pub fn save_data(&mut self) -> SaveOutcome {
        self.flush()
    }

    /// Arm the debounced save without writing.
    pub fn request_save(&mut self, now: Instant) {
        self.scheduler.request_deferred(now);
    }

    /// Run the deferred save if its quiet period is over.
    pub fn tick(&mut self, now: Instant) -> Option<SaveOutcome> {
        if self.scheduler.poll(now) {
            debug!("debounced save firing");
            Some(self.flush())
        } else {
            None
        }
    }

    pub fn cancel_pending(&mut self) -> bool {
        self.scheduler.cancel()
    }

    pub fn on_signal(&mut self, signal: SessionSignal) -> SaveOutcome {
        debug!(?signal, "session signal, saving immediately");
        self.flush()
    }

    /// Replace the collection with what the store holds now. Pending saves
    /// are dropped so stale state cannot overwrite the reloaded data.
    pub fn reload(&mut self) {
        self.scheduler.cancel();
        self.tasks = self.store.load();
    }

    pub fn status_counts(&self) -> Vec<(TaskStatus, usize)> {
        TaskStatus::ALL
            .iter()
            .map(|s| (*s, self.tasks.iter().filter(|t| t.status == *s).count()))
            .collect()
    }

    pub fn priority_counts(&self) -> Vec<(Priority, usize)> {
        Priority::ALL
            .iter()
            .map(|p| (*p, self.tasks.iter().filter(|t| t.priority == *p).count()))
            .collect()
    }

    fn mutated(&mut self) {
        self.scheduler.request_deferred(Instant::now());
        if self.immediate_save {
            self.flush();
        }
    }

    fn flush(&mut self) -> SaveOutcome {
        self.scheduler.cancel();
        let outcome = self.store.save(&self.tasks);
        self.last_save = Some(outcome);
        outcome
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = ulid::Ulid::new().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn validate_title(title: &str) -> Result<String, TaskboardError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskboardError::validation("Task title must not be empty"));
    }
    Ok(title.to_string())
}
