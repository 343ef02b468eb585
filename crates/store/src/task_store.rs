use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use nudge_core::{NewTask, NudgeError, Task};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::snapshot;

/// Thread-safe handle to the task store.
///
/// This is the single lock guarding every read-modify-write sequence on the
/// task collection and the snapshot file. Never hold it across an `.await`.
pub type SharedTaskStore = Arc<Mutex<TaskStore>>;

/// Outcome of loading a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Ordered in-memory task collection with JSON snapshot persistence.
///
/// Insertion order is creation order and is preserved across persist/load.
/// Mutations never persist implicitly: callers pair every mutation with
/// [`persist`](TaskStore::persist) while holding the lock.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
    path: Option<PathBuf>,
}

impl TaskStore {
    /// Store with no backing file; `persist` is a no-op.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Empty store backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
            path: Some(path.into()),
        }
    }

    /// Create a store backed by `path` and load the existing snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, LoadReport), StoreError> {
        let mut store = Self::new(path);
        let report = store.load()?;
        Ok((store, report))
    }

    pub fn into_shared(self) -> SharedTaskStore {
        Arc::new(Mutex::new(self))
    }

    /// Lock a shared store, mapping poisoning to [`StoreError::LockPoisoned`].
    pub fn lock(shared: &SharedTaskStore) -> Result<MutexGuard<'_, TaskStore>, StoreError> {
        shared
            .lock()
            .map_err(|e| StoreError::LockPoisoned(format!("task store: {e}")))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Validate and append a new task.
    ///
    /// The title must be non-empty and the reminder time strictly after
    /// `now`. On failure nothing is mutated and the id counter is untouched.
    pub fn create(&mut self, new: NewTask, now: NaiveDateTime) -> Result<Task, NudgeError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(NudgeError::validation("Please enter a task title"));
        }
        let reminder_time = new
            .reminder_time
            .ok_or_else(|| NudgeError::validation("Please enter both date and time"))?;
        if reminder_time <= now {
            return Err(NudgeError::validation("Reminder time must be in the future"));
        }

        let task = Task {
            id: self.next_id.to_string(),
            title: title.to_string(),
            description: new.description.trim().to_string(),
            reminder_time,
            email: new.email.trim().to_string(),
            phone: new.phone.trim().to_string(),
            is_completed: false,
            is_active: true,
        };
        self.next_id += 1;
        self.tasks.push(task.clone());

        debug!(task_id = %task.id, title = %task.title, "task created");
        Ok(task)
    }

    /// Mark an active task completed and inactive.
    pub fn complete(&mut self, id: &str) -> Result<(), NudgeError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.is_active)
            .ok_or_else(|| NudgeError::NotFound(id.to_string()))?;
        task.is_completed = true;
        task.is_active = false;
        debug!(task_id = %id, "task completed");
        Ok(())
    }

    /// Soft-delete an active task. The record stays in the snapshot as a
    /// tombstone. Returns `false` when the id is missing or already inactive.
    pub fn soft_delete(&mut self, id: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id && t.is_active) {
            Some(task) => {
                task.is_active = false;
                debug!(task_id = %id, "task deleted");
                true
            }
            None => false,
        }
    }

    /// Set the notified flag on a task that is still active and not yet
    /// completed. Returns whether anything changed.
    pub fn mark_notified(&mut self, id: &str) -> bool {
        match self
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.is_active && !t.is_completed)
        {
            Some(task) => {
                task.is_completed = true;
                true
            }
            None => false,
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Every record, including inactive tombstones, in insertion order.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    /// Active tasks in insertion order.
    pub fn list_active(&self) -> Vec<Task> {
        self.tasks.iter().filter(|t| t.is_active).cloned().collect()
    }

    /// Due tasks in insertion order (no reordering by due time).
    pub fn due_tasks(&self, now: NaiveDateTime) -> Vec<Task> {
        self.tasks.iter().filter(|t| t.is_due(now)).cloned().collect()
    }

    /// The id the next created task will receive.
    #[cfg(test)]
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // ── Persistence ─────────────────────────────────────────────

    /// Write the full collection, tombstones included.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        snapshot::write_json(path, &self.tasks)?;
        debug!(path = %path.display(), tasks = self.tasks.len(), "task snapshot written");
        Ok(())
    }

    /// Replace the in-memory collection with the snapshot on disk.
    ///
    /// A missing file yields an empty store. Entries that fail to decode
    /// (missing field, malformed timestamp) or repeat an earlier id are
    /// skipped with a warning. A file that is not a JSON array is an error.
    pub fn load(&mut self) -> Result<LoadReport, StoreError> {
        let Some(path) = self.path.clone() else {
            return Ok(LoadReport::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "no task snapshot, starting empty");
            return Ok(LoadReport::default());
        }

        let json = std::fs::read_to_string(&path)?;
        if json.trim().is_empty() {
            warn!(path = %path.display(), "task snapshot is empty, starting empty");
            return Ok(LoadReport::default());
        }

        let value: serde_json::Value = serde_json::from_str(&json)?;
        let serde_json::Value::Array(entries) = value else {
            return Err(NudgeError::Persistence(format!(
                "{} does not contain a JSON array",
                path.display()
            ))
            .into());
        };

        let mut tasks = Vec::with_capacity(entries.len());
        let mut seen = HashSet::new();
        let mut report = LoadReport::default();

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Task>(entry) {
                Ok(task) => {
                    if seen.insert(task.id.clone()) {
                        tasks.push(task);
                    } else {
                        warn!(index, task_id = %task.id, "skipping task with duplicate id");
                        report.skipped += 1;
                    }
                }
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed task entry");
                    report.skipped += 1;
                }
            }
        }

        let max_id = tasks.iter().filter_map(|t| t.id.parse::<u64>().ok()).max();
        if let Some(max_id) = max_id {
            self.next_id = self.next_id.max(max_id.saturating_add(1));
        }

        report.loaded = tasks.len();
        self.tasks = tasks;

        info!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            next_id = self.next_id,
            "task snapshot loaded"
        );
        Ok(report)
    }
}
