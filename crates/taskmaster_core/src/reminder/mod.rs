//! Reminder scanning.
//!
//! A scan walks every tab and notifies each open task whose reminder time has
//! passed. Nothing is remembered between scans, so an overdue task keeps
//! being notified on every run until it is completed or deleted.
//!
//! [`ReminderScanner`] repeats the scan on a fixed interval as a background
//! tokio task; [`ScannerHandle`] stops it.

use crate::error::AppError;
use crate::model::TaskCollection;
use crate::notify::{Notification, Notifier};
use crate::task_store::{SharedStore, lock};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub task_id: String,
    pub notification: Notification,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub notified: Vec<DueReminder>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: String,
    pub error: AppError,
}

/// Reminders due at `now`, daily tab first, in display order.
pub fn due_reminders(collection: &TaskCollection, now: OffsetDateTime) -> Vec<DueReminder> {
    collection
        .iter()
        .filter(|task| task.reminder_due(now))
        .map(|task| DueReminder {
            task_id: task.id.clone(),
            notification: Notification::reminder(task),
        })
        .collect()
}

/// Sends every reminder, collecting failures instead of stopping at the first.
pub fn deliver(reminders: Vec<DueReminder>, notifier: &dyn Notifier) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    for reminder in reminders {
        match notifier.notify(&reminder.notification) {
            Ok(()) => outcome.notified.push(reminder),
            Err(error) => outcome.failures.push(NotificationFailure {
                task_id: reminder.task_id,
                error,
            }),
        }
    }
    outcome
}

pub fn scan(
    collection: &TaskCollection,
    now: OffsetDateTime,
    notifier: &dyn Notifier,
) -> ScanOutcome {
    deliver(due_reminders(collection, now), notifier)
}

/// Repeats [`scan`] against a shared store every `interval`.
#[derive(Debug, Clone, Copy)]
pub struct ReminderScanner {
    interval: Duration,
}

impl Default for ReminderScanner {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl ReminderScanner {
    pub fn new(interval: Duration) -> Result<Self, AppError> {
        if interval.is_zero() {
            return Err(AppError::invalid_input("reminder interval must be positive"));
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts scanning on the current tokio runtime. The first scan runs one
    /// full interval after this call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, store: SharedStore, notifier: Arc<dyn Notifier>) -> ScannerHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(store, notifier, cancel.clone()));
        ScannerHandle {
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, store: SharedStore, notifier: Arc<dyn Notifier>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("reminder scanner started, interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let due = {
                        let guard = lock(&store);
                        due_reminders(guard.collection(), OffsetDateTime::now_utc())
                    };
                    let outcome = deliver(due, notifier.as_ref());
                    debug!("reminder scan notified {} tasks", outcome.notified.len());
                    for failure in &outcome.failures {
                        warn!("reminder for task {} failed: {}", failure.task_id, failure.error);
                    }
                }
            }
        }

        info!("reminder scanner stopped");
    }
}

/// Owner of a running scanner. Dropping the handle also stops the scanner.
pub struct ScannerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ScannerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels the scanner and waits for its loop to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            warn!("reminder scanner ended abnormally: {err}");
        }
    }
}

impl Drop for ScannerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
