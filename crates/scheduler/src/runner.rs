use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use nudge_core::TaskId;
use nudge_notify::{DispatchReport, Dispatcher};
use nudge_store::{SettingsStore, SharedTaskStore, StoreError, TaskStore};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::metrics::SchedulerMetrics;

/// Outcome of one scheduler pass.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Tasks fired this tick in creation order, with their channel outcomes.
    pub fired: Vec<(TaskId, DispatchReport)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Fires reminders for due tasks.
///
/// Cloning is cheap: every field is shared, so a clone spawned in the
/// background and the original used for manual ticks see the same store,
/// write to the same metrics and never run a pass at the same time.
#[derive(Clone)]
pub struct ReminderScheduler {
    store: SharedTaskStore,
    settings: Arc<SettingsStore>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    metrics: Arc<RwLock<SchedulerMetrics>>,
    /// Held for a whole pass, across dispatch.
    tick_guard: Arc<AsyncMutex<()>>,
}

impl ReminderScheduler {
    pub fn new(
        store: SharedTaskStore,
        settings: Arc<SettingsStore>,
        dispatcher: Arc<Dispatcher>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            settings,
            dispatcher,
            interval,
            metrics: Arc::new(RwLock::new(SchedulerMetrics::default())),
            tick_guard: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get an Arc to the metrics (for external reads without cloning).
    pub fn metrics_handle(&self) -> Arc<RwLock<SchedulerMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Run one pass against the local wall clock.
    pub async fn tick(&self) -> Result<TickReport, StoreError> {
        self.tick_at(nudge_core::time::now_local()).await
    }

    /// Run one pass as if the current time were `now`.
    ///
    /// Due tasks are snapshotted under the store lock, then each is
    /// dispatched with the lock released and marked notified afterwards.
    /// The flag is set whatever the channel outcomes, so a reminder fires
    /// at most once. Passes are serialized: a pass started while another is
    /// dispatching waits for it and then sees its flags.
    pub async fn tick_at(&self, now: NaiveDateTime) -> Result<TickReport, StoreError> {
        let _pass = self.tick_guard.lock().await;
        let start = Instant::now();
        let due = TaskStore::lock(&self.store)?.due_tasks(now);
        if due.is_empty() {
            debug!(%now, "no due tasks");
        } else {
            info!(%now, due = due.len(), "Dispatching due reminders");
        }

        let settings = self.settings.effective();
        let mut report = TickReport::default();

        for task in due {
            let outcome = self.dispatcher.dispatch(&task, &settings).await;

            {
                let mut store = TaskStore::lock(&self.store)?;
                if store.mark_notified(&task.id) {
                    if let Err(e) = store.persist() {
                        warn!(task_id = %task.id, error = %e, "failed to persist notified flag");
                    }
                } else {
                    debug!(task_id = %task.id, "task changed during dispatch, flag not set");
                }
            }

            report.fired.push((task.id, outcome));
        }

        if let Ok(mut m) = self.metrics.write() {
            m.record_tick(now, start.elapsed(), report.fired.iter().map(|(_, r)| r));
        }

        Ok(report)
    }

    /// Run the scheduler on the tokio runtime until the handle is shut down.
    ///
    /// The first tick fires immediately. A tick that overruns the interval
    /// delays the next one instead of bursting to catch up.
    pub fn spawn(self) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let metrics = self.metrics_handle();
        let join = tokio::spawn(async move { self.run(signal).await });
        SchedulerHandle {
            shutdown,
            join,
            metrics,
        }
    }

    async fn run(self, shutdown: Arc<Notify>) {
        info!(interval_secs = self.interval.as_secs(), "Scheduler starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!(error = %e, "Scheduler tick failed");
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    join: JoinHandle<()>,
    metrics: Arc<RwLock<SchedulerMetrics>>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop and wait for the in-flight tick to end.
    pub async fn shutdown(self) {
        info!("Scheduler shutdown requested");
        // `notify_one` stores a permit, so a signal sent mid-tick is seen
        // on the next loop iteration.
        self.shutdown.notify_one();
        if let Err(e) = self.join.await {
            error!(error = %e, "Scheduler task ended abnormally");
        }
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}
