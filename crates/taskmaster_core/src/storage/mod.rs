//! Persistence for the task collection.
//!
//! The whole collection lives in a single slot as one JSON document of the
//! shape `{ "daily": [...], "weekly": [...], "yearly": [...] }`. Writes
//! always replace the full document.

use crate::error::AppError;
use crate::model::TaskCollection;
use log::warn;

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

/// A key-value slot holding the serialized collection.
pub trait Persistence: Send {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<TaskCollection>, AppError>;

    fn save(&self, collection: &TaskCollection) -> Result<(), AppError>;
}

/// Loads the stored collection, falling back to an empty one when the slot is
/// empty, unreadable or holds data that breaks the collection invariants.
pub fn load_or_default(persistence: &dyn Persistence) -> TaskCollection {
    match persistence.load() {
        Ok(Some(collection)) => collection,
        Ok(None) => TaskCollection::new(),
        Err(err) => {
            warn!("ignoring stored tasks: {err}");
            TaskCollection::new()
        }
    }
}

pub fn encode(collection: &TaskCollection) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(collection)?)
}

pub fn decode(content: &str) -> Result<TaskCollection, AppError> {
    let collection: TaskCollection = serde_json::from_str(content)?;
    collection.validate()?;
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, Persistence, decode, encode, load_or_default};
    use crate::model::{Priority, RepeatDay, Task, TaskCollection, TaskType};
    use time::macros::{date, datetime};

    fn populated() -> TaskCollection {
        TaskCollection::from_tasks([
            Task {
                id: "d1".to_string(),
                title: "Stretch".to_string(),
                completed: false,
                due_date: None,
                reminder: Some(datetime!(2025-06-01 07:00:00 +02:00)),
                kind: TaskType::Daily,
                priority: Priority::VeryImportant,
                repeat_days: Some([RepeatDay::Monday, RepeatDay::Thursday].into()),
            },
            Task {
                id: "y1".to_string(),
                title: "Pay rent".to_string(),
                completed: true,
                due_date: Some(date!(2025 - 01 - 01)),
                reminder: None,
                kind: TaskType::Yearly,
                priority: Priority::Important,
                repeat_days: None,
            },
        ])
        .unwrap()
    }

    #[test]
    fn encode_then_decode_preserves_collection() {
        let collection = populated();
        let decoded = decode(&encode(&collection).unwrap()).unwrap();
        assert_eq!(decoded, collection);
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert_eq!(decode("{ daily: ").unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn load_or_default_is_empty_for_absent_slot() {
        let store = MemoryStore::new();
        assert!(load_or_default(&store).is_empty());
    }

    #[test]
    fn load_or_default_fails_soft_on_garbage() {
        let store = MemoryStore::with_raw("not json at all");
        assert_eq!(load_or_default(&store), TaskCollection::new());
    }

    #[test]
    fn load_or_default_returns_saved_collection() {
        let store = MemoryStore::new();
        store.save(&populated()).unwrap();
        assert_eq!(load_or_default(&store), populated());
    }
}
