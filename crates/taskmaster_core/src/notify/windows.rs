use crate::error::AppError;
use crate::notify::{Notification, NotificationStyle, Notifier};
use tauri_winrt_notification::{Duration, Toast};

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        let duration = match notification.style {
            NotificationStyle::Urgent => Duration::Long,
            NotificationStyle::Standard | NotificationStyle::Success => Duration::Short,
        };

        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&notification.title)
            .text1(&notification.description)
            .duration(duration)
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
