use crate::error::AppError;
use crate::notify::{Notification, NotificationStyle, Notifier};
use notify_rust::{Timeout, Urgency};

const APP_NAME: &str = "taskmaster";

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        let urgency = match notification.style {
            NotificationStyle::Urgent => Urgency::Critical,
            NotificationStyle::Standard => Urgency::Normal,
            NotificationStyle::Success => Urgency::Low,
        };

        notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(&notification.title)
            .body(&notification.description)
            .urgency(urgency)
            .timeout(Timeout::Default)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
