//! Core of Task Master: the task model, its persisted store, the new-task
//! form logic and the reminder scanner.

pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod storage;
pub mod task_store;

pub use error::AppError;
pub use form::TaskForm;
pub use model::{Priority, RepeatDay, Task, TaskCollection, TaskType};
pub use reminder::{ReminderScanner, ScannerHandle};
pub use task_store::{NewTask, SharedStore, TaskStore};
