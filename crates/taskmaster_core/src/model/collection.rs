use crate::error::AppError;
use crate::model::{Task, TaskType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The three tabs of tasks, keyed by recurrence type.
///
/// Every task sits under the key matching its `type` and ids are unique
/// across all three lists. Fields stay private so the only way in is
/// through [`TaskCollection::from_tasks`], deserialization followed by
/// [`TaskCollection::validate`], or the store's mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCollection {
    #[serde(default)]
    daily: Vec<Task>,
    #[serde(default)]
    weekly: Vec<Task>,
    #[serde(default)]
    yearly: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection by routing each task to its tab, in order.
    pub fn from_tasks<I: IntoIterator<Item = Task>>(tasks: I) -> Result<Self, AppError> {
        let mut collection = Self::new();
        for task in tasks {
            if collection.contains(&task.id) {
                return Err(AppError::invalid_data(format!(
                    "duplicate task id '{}'",
                    task.id
                )));
            }
            collection.push(task);
        }
        Ok(collection)
    }

    pub fn tasks(&self, kind: TaskType) -> &[Task] {
        match kind {
            TaskType::Daily => &self.daily,
            TaskType::Weekly => &self.weekly,
            TaskType::Yearly => &self.yearly,
        }
    }

    fn tasks_mut(&mut self, kind: TaskType) -> &mut Vec<Task> {
        match kind {
            TaskType::Daily => &mut self.daily,
            TaskType::Weekly => &mut self.weekly,
            TaskType::Yearly => &mut self.yearly,
        }
    }

    /// All tasks, daily first, then weekly, then yearly.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        TaskType::ALL
            .into_iter()
            .flat_map(move |kind| self.tasks(kind).iter())
    }

    pub fn len(&self) -> usize {
        self.daily.len() + self.weekly.len() + self.yearly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Checks the partition and uniqueness invariants of loaded data.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        for kind in TaskType::ALL {
            for task in self.tasks(kind) {
                if task.kind != kind {
                    return Err(AppError::invalid_data(format!(
                        "task '{}' has type {} but is stored under {}",
                        task.id, task.kind, kind
                    )));
                }
                if task.title.trim().is_empty() {
                    return Err(AppError::invalid_data(format!(
                        "task '{}' has an empty title",
                        task.id
                    )));
                }
                if !seen.insert(task.id.as_str()) {
                    return Err(AppError::invalid_data(format!(
                        "duplicate task id '{}'",
                        task.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, task: Task) {
        self.tasks_mut(task.kind).push(task);
    }

    fn locate(&self, id: &str) -> Option<(TaskType, usize)> {
        TaskType::ALL.into_iter().find_map(|kind| {
            self.tasks(kind)
                .iter()
                .position(|task| task.id == id)
                .map(|index| (kind, index))
        })
    }

    pub(crate) fn toggle(&mut self, id: &str) -> Option<&Task> {
        let (kind, index) = self.locate(id)?;
        let task = &mut self.tasks_mut(kind)[index];
        task.completed = !task.completed;
        Some(&*task)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Task> {
        let (kind, index) = self.locate(id)?;
        Some(self.tasks_mut(kind).remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::TaskCollection;
    use crate::model::{Priority, Task, TaskType};

    fn task(id: &str, kind: TaskType) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            completed: false,
            due_date: None,
            reminder: None,
            kind,
            priority: Priority::Normal,
            repeat_days: None,
        }
    }

    #[test]
    fn from_tasks_routes_by_type_and_keeps_order() {
        let collection = TaskCollection::from_tasks([
            task("a", TaskType::Weekly),
            task("b", TaskType::Daily),
            task("c", TaskType::Weekly),
        ])
        .unwrap();

        let weekly: Vec<_> = collection
            .tasks(TaskType::Weekly)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(weekly, ["a", "c"]);
        assert_eq!(collection.tasks(TaskType::Daily).len(), 1);
        assert!(collection.tasks(TaskType::Yearly).is_empty());
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn from_tasks_rejects_duplicate_ids_across_tabs() {
        let err =
            TaskCollection::from_tasks([task("a", TaskType::Daily), task("a", TaskType::Yearly)])
                .unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn iter_flattens_daily_weekly_yearly() {
        let collection = TaskCollection::from_tasks([
            task("y", TaskType::Yearly),
            task("w", TaskType::Weekly),
            task("d", TaskType::Daily),
        ])
        .unwrap();

        let ids: Vec<_> = collection.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, ["d", "w", "y"]);
    }

    #[test]
    fn toggle_and_remove_search_every_tab() {
        let mut collection =
            TaskCollection::from_tasks([task("d", TaskType::Daily), task("y", TaskType::Yearly)])
                .unwrap();

        assert!(collection.toggle("y").unwrap().completed);
        assert!(collection.toggle("missing").is_none());

        let removed = collection.remove("y").unwrap();
        assert_eq!(removed.id, "y");
        assert!(collection.remove("y").is_none());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn validate_rejects_task_under_wrong_key() {
        let collection: TaskCollection = serde_json::from_value(serde_json::json!({
            "daily": [{ "id": "a", "title": "misfiled", "type": "weekly" }],
            "weekly": [],
            "yearly": []
        }))
        .unwrap();

        assert_eq!(collection.validate().unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let collection: TaskCollection = serde_json::from_value(serde_json::json!({
            "daily": [{ "id": "a", "title": "one", "type": "daily" }],
            "weekly": [{ "id": "a", "title": "two", "type": "weekly" }]
        }))
        .unwrap();

        assert!(collection.validate().is_err());
    }

    #[test]
    fn serializes_all_three_keys_even_when_empty() {
        let value = serde_json::to_value(TaskCollection::new()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "daily": [], "weekly": [], "yearly": [] })
        );
    }
}
