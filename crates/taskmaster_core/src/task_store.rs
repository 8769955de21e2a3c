use crate::error::AppError;
use crate::model::{Priority, RepeatDay, Task, TaskCollection, TaskType};
use crate::notify::{Notification, Notifier};
use crate::storage::{Persistence, load_or_default};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Store shared between the command loop and the reminder scanner.
pub type SharedStore = Arc<Mutex<TaskStore>>;

/// Locks a shared store, recovering the guard if a previous holder panicked.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, TaskStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything needed to create a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<Date>,
    pub reminder: Option<OffsetDateTime>,
    pub kind: TaskType,
    pub priority: Priority,
    pub repeat_days: Option<BTreeSet<RepeatDay>>,
}

impl NewTask {
    pub fn new<T: Into<String>>(title: T, kind: TaskType) -> Self {
        Self {
            title: title.into(),
            due_date: None,
            reminder: None,
            kind,
            priority: Priority::default(),
            repeat_days: None,
        }
    }
}

/// Owns the task collection and keeps its persisted copy in sync.
///
/// Every mutation is applied to a copy, written out, and only then made
/// visible. A failed write leaves the in-memory collection untouched.
pub struct TaskStore {
    collection: TaskCollection,
    persistence: Box<dyn Persistence>,
    notifier: Arc<dyn Notifier>,
}

impl TaskStore {
    /// Loads the collection once from `persistence`; unreadable state starts
    /// an empty collection instead of failing.
    pub fn open(persistence: Box<dyn Persistence>, notifier: Arc<dyn Notifier>) -> Self {
        let collection = load_or_default(persistence.as_ref());
        debug!("opened task store with {} tasks", collection.len());
        Self {
            collection,
            persistence,
            notifier,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn collection(&self) -> &TaskCollection {
        &self.collection
    }

    pub fn tasks(&self, kind: TaskType) -> &[Task] {
        self.collection.tasks(kind)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.collection.get(id.trim())
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn add(&mut self, draft: NewTask) -> Result<Task, AppError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        let repeat_days = match draft.kind {
            TaskType::Daily => draft.repeat_days.filter(|days| !days.is_empty()),
            TaskType::Weekly | TaskType::Yearly => None,
        };

        let task = Task {
            id: self.fresh_id(),
            title: title.to_string(),
            completed: false,
            due_date: draft.due_date,
            reminder: draft.reminder,
            kind: draft.kind,
            priority: draft.priority,
            repeat_days,
        };

        let mut next = self.collection.clone();
        next.push(task.clone());
        self.commit(next)?;
        debug!("added {} task {}", task.kind, task.id);

        if let Err(err) = self.notifier.notify(&Notification::task_added(&task)) {
            warn!("could not acknowledge task {}: {err}", task.id);
        }

        Ok(task)
    }

    /// Flips `completed` on the task with `id`. Unknown ids are ignored and
    /// return `None` without touching storage.
    pub fn toggle(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let id = id.trim();
        let mut next = self.collection.clone();
        let Some(task) = next.toggle(id).cloned() else {
            return Ok(None);
        };

        self.commit(next)?;
        debug!("task {} completed={}", task.id, task.completed);
        Ok(Some(task))
    }

    /// Removes the task with `id`, returning it. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let id = id.trim();
        let mut next = self.collection.clone();
        let Some(task) = next.remove(id) else {
            return Ok(None);
        };

        self.commit(next)?;
        debug!("deleted task {}", task.id);
        Ok(Some(task))
    }

    fn commit(&mut self, next: TaskCollection) -> Result<(), AppError> {
        self.persistence.save(&next)?;
        self.collection = next;
        Ok(())
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.collection.contains(&id) {
                return id;
            }
        }
    }
}
