use std::sync::Arc;

use chrono::NaiveDateTime;
use nudge_core::{Config, EmailSettings, NewTask, NudgeError, Task};
use nudge_notify::{DesktopNotifier, Dispatcher, Popup};
use nudge_scheduler::{ReminderScheduler, SchedulerHandle, SchedulerMetrics, TickReport};
use nudge_store::{DataDirLock, SettingsStore, SharedTaskStore, TaskStore};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Task CRUD, email settings and scheduler control behind one handle.
///
/// Every mutation runs with the store lock held and persists the snapshot
/// before releasing it. A failed persist is logged and the in-memory change
/// stands; the next successful persist writes it.
///
/// The service owns its data directory for as long as it lives: opening a
/// second service on the same directory fails, in this process or another.
pub struct ReminderService {
    config: Config,
    _dir_lock: DataDirLock,
    store: SharedTaskStore,
    settings: Arc<SettingsStore>,
    scheduler: ReminderScheduler,
}

impl ReminderService {
    /// Load both stores from `config.data_dir` and wire popups to `popup_tx`.
    pub fn open(config: &Config, popup_tx: UnboundedSender<Popup>) -> Result<Self, NudgeError> {
        let desktop = DesktopNotifier::new(popup_tx);
        let dispatcher = Dispatcher::with_smtp(Box::new(desktop), config.smtp_timeout);
        Self::with_dispatcher(config, dispatcher)
    }

    /// Like [`open`](Self::open) with a caller-supplied dispatcher.
    pub fn with_dispatcher(config: &Config, dispatcher: Dispatcher) -> Result<Self, NudgeError> {
        let dir_lock = DataDirLock::acquire(&config.data_dir)?;
        let (store, report) = TaskStore::open(config.tasks_path())?;
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "some saved tasks could not be read");
        }
        let store = store.into_shared();
        let settings = Arc::new(SettingsStore::open(config.settings_path()));

        let scheduler = ReminderScheduler::new(
            store.clone(),
            settings.clone(),
            Arc::new(dispatcher),
            config.tick_interval,
        );

        Ok(Self {
            config: config.clone(),
            _dir_lock: dir_lock,
            store,
            settings,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ── Tasks ───────────────────────────────────────────────────

    /// Create a task due in the future (relative to the local clock).
    pub fn create_task(&self, new: NewTask) -> Result<Task, NudgeError> {
        self.create_task_at(new, nudge_core::time::now_local())
    }

    /// Create a task, validating against `now`.
    pub fn create_task_at(&self, new: NewTask, now: NaiveDateTime) -> Result<Task, NudgeError> {
        let mut store = TaskStore::lock(&self.store)?;
        let task = store.create(new, now)?;
        persist_or_warn(&store, "create");
        info!(task_id = %task.id, title = %task.title, due = %task.formatted_due(), "Task added");
        Ok(task)
    }

    /// Mark a task completed and remove it from the active list.
    pub fn complete_task(&self, id: &str) -> Result<(), NudgeError> {
        let mut store = TaskStore::lock(&self.store)?;
        store.complete(id)?;
        persist_or_warn(&store, "complete");
        info!(task_id = %id, "Task completed");
        Ok(())
    }

    /// Soft-delete a task. A missing or already inactive id is `NotFound`.
    pub fn delete_task(&self, id: &str) -> Result<(), NudgeError> {
        let mut store = TaskStore::lock(&self.store)?;
        if !store.soft_delete(id) {
            return Err(NudgeError::NotFound(id.to_string()));
        }
        persist_or_warn(&store, "delete");
        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Active tasks in creation order.
    pub fn list_active_tasks(&self) -> Result<Vec<Task>, NudgeError> {
        Ok(TaskStore::lock(&self.store)?.list_active())
    }

    // ── Email settings ──────────────────────────────────────────

    pub fn get_email_settings(&self) -> EmailSettings {
        self.settings.get()
    }

    pub fn save_email_settings(&self, settings: EmailSettings) -> Result<(), NudgeError> {
        self.settings.save(settings)?;
        Ok(())
    }

    /// Check that `settings` can connect and authenticate, without sending.
    pub async fn test_email_connection(&self, settings: &EmailSettings) -> Result<(), NudgeError> {
        let settings = settings.clone().with_env_credentials();
        nudge_notify::test_connection(&settings, self.config.smtp_timeout)
            .await
            .map_err(|e| e.into_delivery("email"))
    }

    // ── Scheduler ───────────────────────────────────────────────

    /// Start the background scheduler on the current tokio runtime.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        self.scheduler.clone().spawn()
    }

    /// Run one scheduler pass now.
    pub async fn run_scheduler_once(&self) -> Result<TickReport, NudgeError> {
        Ok(self.scheduler.tick().await?)
    }

    /// Run one scheduler pass as if the current time were `now`.
    pub async fn run_scheduler_at(&self, now: NaiveDateTime) -> Result<TickReport, NudgeError> {
        Ok(self.scheduler.tick_at(now).await?)
    }

    pub fn scheduler_metrics(&self) -> SchedulerMetrics {
        self.scheduler.metrics()
    }
}

fn persist_or_warn(store: &TaskStore, op: &str) {
    if let Err(e) = store.persist() {
        warn!(op, error = %e, "failed to persist tasks, change kept in memory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn open(dir: &TempDir) -> (ReminderService, mpsc::UnboundedReceiver<Popup>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config::with_data_dir(dir.path());
        (ReminderService::open(&config, tx).unwrap(), rx)
    }

    #[test]
    fn create_then_list() {
        let dir = TempDir::new().unwrap();
        let (service, _rx) = open(&dir);

        let a = service
            .create_task_at(NewTask::new("Pay bill", at(9, 30)), at(9, 0))
            .unwrap();
        let b = service
            .create_task_at(NewTask::new("Call mom", at(10, 0)), at(9, 0))
            .unwrap();
        assert_eq!(a.id, "0");
        assert_eq!(b.id, "1");

        let titles: Vec<String> = service
            .list_active_tasks()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Pay bill", "Call mom"]);
    }

    #[test]
    fn validation_errors_surface() {
        let dir = TempDir::new().unwrap();
        let (service, _rx) = open(&dir);

        let err = service
            .create_task_at(NewTask::new("  ", at(9, 30)), at(9, 0))
            .unwrap_err();
        assert!(matches!(err, NudgeError::Validation(_)));

        let err = service
            .create_task_at(NewTask::new("Late", at(8, 0)), at(9, 0))
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Reminder time must be in the future");
        assert!(service.list_active_tasks().unwrap().is_empty());
    }

    #[test]
    fn complete_and_delete_hide_tasks() {
        let dir = TempDir::new().unwrap();
        let (service, _rx) = open(&dir);
        let a = service
            .create_task_at(NewTask::new("A", at(9, 30)), at(9, 0))
            .unwrap();
        let b = service
            .create_task_at(NewTask::new("B", at(9, 30)), at(9, 0))
            .unwrap();

        service.complete_task(&a.id).unwrap();
        service.delete_task(&b.id).unwrap();
        assert!(service.list_active_tasks().unwrap().is_empty());

        assert!(matches!(
            service.delete_task(&b.id),
            Err(NudgeError::NotFound(_))
        ));
        assert!(matches!(
            service.complete_task("42"),
            Err(NudgeError::NotFound(_))
        ));
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let (service, _rx) = open(&dir);
            service
                .create_task_at(NewTask::new("Keep", at(9, 30)), at(9, 0))
                .unwrap();
            let gone = service
                .create_task_at(NewTask::new("Drop", at(9, 30)), at(9, 0))
                .unwrap();
            service.delete_task(&gone.id).unwrap();
        }

        let (service, _rx) = open(&dir);
        let active = service.list_active_tasks().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Keep");

        let next = service
            .create_task_at(NewTask::new("Next", at(9, 30)), at(9, 0))
            .unwrap();
        assert_eq!(next.id, "2");
    }

    #[test]
    fn email_settings_round_trip() {
        let dir = TempDir::new().unwrap();
        let (service, _rx) = open(&dir);
        assert_eq!(service.get_email_settings(), EmailSettings::default());

        let settings = EmailSettings {
            smtp_server: "mail.example.com".to_string(),
            smtp_port: 465,
            email_username: "me@example.com".to_string(),
            email_password: "secret".to_string(),
        };
        service.save_email_settings(settings.clone()).unwrap();
        drop(service);

        let (service, _rx) = open(&dir);
        assert_eq!(service.get_email_settings(), settings);
    }

    #[tokio::test]
    async fn scheduler_pass_pops_up_due_task() {
        let dir = TempDir::new().unwrap();
        let (service, mut rx) = open(&dir);
        let task = service
            .create_task_at(
                NewTask::new("Pay bill", at(9, 30)).with_description("electricity"),
                at(9, 0),
            )
            .unwrap();

        let report = service.run_scheduler_at(at(9, 30)).await.unwrap();
        assert_eq!(report.fired.len(), 1);
        let popup = rx.try_recv().unwrap();
        assert_eq!(popup.task_id, task.id);
        assert_eq!(popup.message(), "Reminder: Pay bill\n\nelectricity");

        // Notified tasks stay listed until the user completes them.
        let active = service.list_active_tasks().unwrap();
        assert_eq!(active.len(), 1);
        assert!(active[0].is_completed);
        assert_eq!(service.scheduler_metrics().reminders_fired, 1);
    }

    #[test]
    fn second_service_on_same_dir_is_refused() {
        let dir = TempDir::new().unwrap();
        let (service, _rx) = open(&dir);

        let (tx, _rx2) = mpsc::unbounded_channel();
        let config = Config::with_data_dir(dir.path());
        let err = ReminderService::open(&config, tx.clone()).err().unwrap();
        assert!(matches!(err, NudgeError::Persistence(_)));
        assert!(err.to_string().contains("in use by another nudge process"));

        drop(service);
        assert!(ReminderService::open(&config, tx).is_ok());
    }

    #[tokio::test]
    async fn test_connection_without_credentials_is_delivery_error() {
        let dir = TempDir::new().unwrap();
        let (service, _rx) = open(&dir);
        if std::env::var("SMTP_USERNAME").is_ok() {
            return;
        }
        let err = service
            .test_email_connection(&EmailSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::Delivery { .. }));
    }
}
