//! Notification sink.
//!
//! The core decides when to notify and what to say; implementations of
//! [`Notifier`] decide how it is shown.

use crate::error::AppError;
use crate::model::{Priority, Task};
use std::fmt;
use std::sync::Arc;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "TASKMASTER_DISABLE_NOTIFICATIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStyle {
    /// Acknowledges a user action.
    Success,
    Standard,
    Urgent,
}

impl NotificationStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Standard => "standard",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NotificationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub style: NotificationStyle,
}

impl Notification {
    pub fn task_added(task: &Task) -> Self {
        Self {
            title: "Task Added".to_string(),
            description: task.title.clone(),
            style: NotificationStyle::Success,
        }
    }

    pub fn reminder(task: &Task) -> Self {
        let (title, style) = match task.priority {
            Priority::VeryImportant => ("🔥 Important Task!", NotificationStyle::Urgent),
            _ => ("Reminder", NotificationStyle::Standard),
        };
        Self {
            title: title.to_string(),
            description: task.title.clone(),
            style,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: &Notification) -> Result<(), AppError> {
        Ok(())
    }
}

/// Desktop notifier for this platform, or a no-op one when notifications are
/// disabled through the environment or unsupported here.
pub fn notifier_from_env() -> Result<Arc<dyn Notifier>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Ok(Arc::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(message) => {
                log::warn!("desktop notifications unavailable: {message}");
                Ok(Arc::new(NoopNotifier))
            }
            other => Err(other),
        },
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Arc<dyn Notifier>, AppError> {
    Ok(Arc::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Arc<dyn Notifier>, AppError> {
    Ok(Arc::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Arc<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
