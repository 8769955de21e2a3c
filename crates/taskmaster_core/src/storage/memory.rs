use crate::error::AppError;
use crate::model::TaskCollection;
use crate::storage::{Persistence, decode, encode};
use std::sync::{Arc, Mutex, PoisonError};

/// In-process slot. Clones share the same slot, so a caller can hand one
/// clone to a store and inspect what was written through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    value: Option<String>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw<S: Into<String>>(raw: S) -> Self {
        let store = Self::new();
        store.slot().value = Some(raw.into());
        store
    }

    /// Serialized document currently held, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot().value.clone()
    }

    /// Makes every later `save` fail with an I/O error.
    pub fn reject_writes(&self, reject: bool) {
        self.slot().reject_writes = reject;
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Result<Option<TaskCollection>, AppError> {
        self.slot().value.as_deref().map(decode).transpose()
    }

    fn save(&self, collection: &TaskCollection) -> Result<(), AppError> {
        let content = encode(collection)?;
        let mut slot = self.slot();
        if slot.reject_writes {
            return Err(AppError::io("slot is read-only"));
        }
        slot.value = Some(content);
        Ok(())
    }
}
