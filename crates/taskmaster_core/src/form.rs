use crate::error::AppError;
use crate::model::{Priority, RepeatDay, Task, TaskType};
use crate::task_store::{NewTask, TaskStore};
use std::collections::BTreeSet;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const DEFAULT_REMINDER_TIME: &str = "12:00";

const TIME_OF_DAY: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none repr:24]:[minute]");

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Parses an `HH:MM` 24-hour time of day.
pub fn parse_time_of_day(raw: &str) -> Result<Time, AppError> {
    Time::parse(raw.trim(), TIME_OF_DAY)
        .map_err(|_| AppError::invalid_input(format!("time must be HH:MM, got '{}'", raw.trim())))
}

/// Field state of the new-task form.
///
/// The reminder is entered as a calendar date plus a separate time of day.
/// Type, priority and the time of day survive a submission; everything else
/// is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub due_date: Option<Date>,
    pub reminder_date: Option<Date>,
    pub reminder_time: String,
    pub priority: Priority,
    kind: TaskType,
    repeat_days: BTreeSet<RepeatDay>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            due_date: None,
            reminder_date: None,
            reminder_time: DEFAULT_REMINDER_TIME.to_string(),
            priority: Priority::default(),
            kind: TaskType::Daily,
            repeat_days: BTreeSet::new(),
        }
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> TaskType {
        self.kind
    }

    pub fn set_kind(&mut self, kind: TaskType) {
        self.kind = kind;
    }

    /// Repeat days are only offered for daily tasks.
    pub fn shows_repeat_days(&self) -> bool {
        self.kind == TaskType::Daily
    }

    pub fn repeat_days(&self) -> &BTreeSet<RepeatDay> {
        &self.repeat_days
    }

    pub fn set_repeat_day(&mut self, day: RepeatDay, checked: bool) {
        if checked {
            self.repeat_days.insert(day);
        } else {
            self.repeat_days.remove(&day);
        }
    }

    /// Reminder timestamp from the date and time fields, in `offset`.
    pub fn reminder(&self, offset: UtcOffset) -> Result<Option<OffsetDateTime>, AppError> {
        let Some(date) = self.reminder_date else {
            return Ok(None);
        };
        let time = parse_time_of_day(&self.reminder_time)?;
        Ok(Some(PrimitiveDateTime::new(date, time).assume_offset(offset)))
    }

    /// Builds the task to create, or `None` when the title is blank.
    pub fn draft(&self, offset: UtcOffset) -> Result<Option<NewTask>, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Ok(None);
        }

        let repeat_days = (self.shows_repeat_days() && !self.repeat_days.is_empty())
            .then(|| self.repeat_days.clone());

        Ok(Some(NewTask {
            title: title.to_string(),
            due_date: self.due_date,
            reminder: self.reminder(offset)?,
            kind: self.kind,
            priority: self.priority,
            repeat_days,
        }))
    }

    /// Adds the drafted task to `store` and clears the non-sticky fields.
    ///
    /// A blank title is ignored: nothing is created and `Ok(None)` comes back.
    /// On any error the form keeps its contents.
    pub fn submit(
        &mut self,
        store: &mut TaskStore,
        offset: UtcOffset,
    ) -> Result<Option<Task>, AppError> {
        let Some(draft) = self.draft(offset)? else {
            return Ok(None);
        };
        let task = store.add(draft)?;
        self.clear_after_submit();
        Ok(Some(task))
    }

    fn clear_after_submit(&mut self) {
        self.title.clear();
        self.due_date = None;
        self.reminder_date = None;
        self.repeat_days.clear();
    }
}
