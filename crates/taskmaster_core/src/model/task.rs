use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "due_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder: Option<OffsetDateTime>,
    #[serde(rename = "type")]
    pub kind: TaskType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_days: Option<BTreeSet<RepeatDay>>,
}

impl Task {
    /// True once the reminder time has been reached and the task is still open.
    pub fn reminder_due(&self, now: OffsetDateTime) -> bool {
        !self.completed && self.reminder.is_some_and(|reminder| reminder <= now)
    }
}

/// Recurrence type; also names the collection (tab) the task lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Daily,
    Weekly,
    Yearly,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Daily, TaskType::Weekly, TaskType::Yearly];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Yearly => "yearly",
        }
    }

    pub fn tab_title(self) -> &'static str {
        match self {
            Self::Daily => "Daily Tasks",
            Self::Weekly => "Weekly Planner",
            Self::Yearly => "Yearly Goals",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "yearly" => Ok(Self::Yearly),
            other => Err(AppError::invalid_input(format!(
                "unknown task type '{other}' (expected daily, weekly or yearly)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    VeryImportant,
    Important,
    #[default]
    Normal,
    Optional,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryImportant => "very-important",
            Self::Important => "important",
            Self::Normal => "normal",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "very-important" => Ok(Self::VeryImportant),
            "important" => Ok(Self::Important),
            "normal" => Ok(Self::Normal),
            "optional" => Ok(Self::Optional),
            other => Err(AppError::invalid_input(format!(
                "unknown priority '{other}' (expected very-important, important, normal or optional)"
            ))),
        }
    }
}

/// Weekday a daily task repeats on. Ordered Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RepeatDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl RepeatDay {
    pub const ALL: [RepeatDay; 7] = [
        RepeatDay::Sunday,
        RepeatDay::Monday,
        RepeatDay::Tuesday,
        RepeatDay::Wednesday,
        RepeatDay::Thursday,
        RepeatDay::Friday,
        RepeatDay::Saturday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for RepeatDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RepeatDay {
    type Err = AppError;

    /// Accepts the full weekday name or its three-letter abbreviation, any case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        RepeatDay::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_ascii_lowercase();
                name == wanted || (wanted.len() == 3 && name.starts_with(&wanted))
            })
            .ok_or_else(|| AppError::invalid_input(format!("unknown weekday '{}'", raw.trim())))
    }
}

/// Parses a calendar date typed by a user, `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::invalid_input("date must be YYYY-MM-DD"))
}

/// Serde adapter for `dueDate`.
///
/// Written as `YYYY-MM-DD`. Reading also accepts a full RFC 3339 timestamp,
/// which is what the browser build stored; the local calendar date is kept.
mod due_date {
    use super::DATE_FORMAT;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::{Date, OffsetDateTime, UtcOffset};

    pub fn serialize<S: Serializer>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => {
                let text = date
                    .format(DATE_FORMAT)
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|text| parse_stored(&text).map_err(D::Error::custom))
            .transpose()
    }

    fn parse_stored(text: &str) -> Result<Date, String> {
        let trimmed = text.trim();
        if let Ok(date) = Date::parse(trimmed, DATE_FORMAT) {
            return Ok(date);
        }
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        OffsetDateTime::parse(trimmed, &Rfc3339)
            .map(|timestamp| timestamp.to_offset(offset).date())
            .map_err(|_| format!("invalid dueDate '{trimmed}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, RepeatDay, Task, TaskType, parse_date};
    use std::collections::BTreeSet;
    use time::macros::{date, datetime};

    fn sample() -> Task {
        Task {
            id: "task-1".to_string(),
            title: "Pay rent".to_string(),
            completed: false,
            due_date: Some(date!(2025 - 01 - 01)),
            reminder: Some(datetime!(2025-01-01 09:30 UTC)),
            kind: TaskType::Yearly,
            priority: Priority::Important,
            repeat_days: None,
        }
    }

    #[test]
    fn serializes_with_browser_field_names() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["id"], "task-1");
        assert_eq!(value["type"], "yearly");
        assert_eq!(value["priority"], "important");
        assert_eq!(value["dueDate"], "2025-01-01");
        assert_eq!(value["reminder"], "2025-01-01T09:30:00Z");
        assert_eq!(value["completed"], false);
        assert!(value.get("repeatDays").is_none());
    }

    #[test]
    fn deserializes_minimal_task_with_defaults() {
        let task: Task =
            serde_json::from_str(r#"{"id":"a","title":"Buy milk","type":"daily"}"#).unwrap();

        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Normal);
        assert_eq!(task.due_date, None);
        assert_eq!(task.reminder, None);
        assert_eq!(task.repeat_days, None);
    }

    #[test]
    fn deserializes_browser_timestamps() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": "abc123xyz",
                "title": "Stretch",
                "completed": false,
                "type": "daily",
                "priority": "very-important",
                "dueDate": "2025-03-10T12:00:00.000Z",
                "reminder": "2025-03-10T08:15:00.000Z",
                "repeatDays": ["Monday", "Friday"]
            }"#,
        )
        .unwrap();

        assert!(task.due_date.is_some());
        assert_eq!(task.reminder, Some(datetime!(2025-03-10 08:15 UTC)));
        assert_eq!(task.priority, Priority::VeryImportant);
        let expected: BTreeSet<RepeatDay> = [RepeatDay::Monday, RepeatDay::Friday].into();
        assert_eq!(task.repeat_days, Some(expected));
    }

    #[test]
    fn rejects_unknown_priority_in_storage() {
        let result: Result<Task, _> =
            serde_json::from_str(r#"{"id":"a","title":"t","type":"daily","priority":"urgent"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reminder_due_requires_open_task_and_past_time() {
        let now = datetime!(2025-01-01 10:00 UTC);
        let mut task = sample();
        assert!(task.reminder_due(now));

        task.completed = true;
        assert!(!task.reminder_due(now));

        task.completed = false;
        task.reminder = Some(datetime!(2025-01-01 10:01 UTC));
        assert!(!task.reminder_due(now));

        task.reminder = None;
        assert!(!task.reminder_due(now));
    }

    #[test]
    fn enums_parse_from_user_text() {
        assert_eq!("Weekly".parse::<TaskType>().unwrap(), TaskType::Weekly);
        assert_eq!(
            "very_important".parse::<Priority>().unwrap(),
            Priority::VeryImportant
        );
        assert_eq!("tue".parse::<RepeatDay>().unwrap(), RepeatDay::Tuesday);
        assert_eq!("SATURDAY".parse::<RepeatDay>().unwrap(), RepeatDay::Saturday);
        assert!("monthly".parse::<TaskType>().is_err());
        assert!("someday".parse::<RepeatDay>().is_err());
    }

    #[test]
    fn parse_date_accepts_iso_calendar_dates_only() {
        assert_eq!(parse_date(" 2025-01-01 ").unwrap(), date!(2025 - 01 - 01));
        assert_eq!(parse_date("01/01/2025").unwrap_err().code(), "invalid_input");
    }
}
