//! In-memory section store, used by tests and ephemeral setups.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::storage::{SectionDocument, SectionStore, StorageError};

/// Holds the last saved document in memory.
///
/// Clones share state, so a test can keep a handle to inspect what the
/// ACL store persisted or to make the next saves fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    doc: Arc<Mutex<SectionDocument>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_document(doc: SectionDocument) -> Self {
        let store = Self::default();
        *store.doc.lock() = doc;
        store
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the last successfully saved document.
    pub fn document(&self) -> SectionDocument {
        self.doc.lock().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SectionStore for MemoryStore {
    fn load(&self) -> Result<SectionDocument, StorageError> {
        Ok(self.doc.lock().clone())
    }

    fn save(&self, doc: &SectionDocument) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected("memory store is read-only".to_string()));
        }
        *self.doc.lock() = doc.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
