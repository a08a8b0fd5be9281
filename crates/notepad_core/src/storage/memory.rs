//! In-process snapshot storage.
//!
//! Keeps the serialized collection in memory so reloads go through the same
//! JSON path as persistent backends. Failures can be injected to exercise
//! the store's degrade-and-log policy.

use crate::model::page::Page;
use crate::storage::{PageStorage, StorageError, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Which failure, if any, writes should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    Unavailable,
    QuotaExceeded,
}

#[derive(Debug, Default)]
struct MemoryState {
    document: Option<String>,
    fail_reads: bool,
    fail_writes: Option<WriteFailure>,
}

/// Snapshot storage living in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds storage with an already-saved collection.
    pub fn with_pages(pages: &[Page]) -> StorageResult<Self> {
        let storage = Self::new();
        storage.save_all(pages)?;
        storage.writes.store(0, Ordering::SeqCst);
        Ok(storage)
    }

    /// Seeds storage with a raw document, valid or not.
    pub fn with_document(document: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut state) = storage.state.lock() {
            state.document = Some(document.into());
        }
        storage
    }

    /// Makes every subsequent `load` fail with `Unavailable`.
    pub fn fail_reads(&self, enabled: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_reads = enabled;
        }
    }

    /// Makes every subsequent write fail with the given error.
    pub fn fail_writes_with(&self, failure: Option<WriteFailure>) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = failure;
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored document, if any.
    pub fn document(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.document.clone())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl PageStorage for MemoryStorage {
    fn load(&self) -> StorageResult<Vec<Page>> {
        let state = self.lock()?;
        if state.fail_reads {
            return Err(StorageError::Unavailable(
                "memory storage reads disabled".to_string(),
            ));
        }

        match state.document.as_deref() {
            Some(document) => Ok(serde_json::from_str(document).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&self, pages: &[Page]) -> StorageResult<()> {
        let mut state = self.lock()?;
        match state.fail_writes {
            Some(WriteFailure::Unavailable) => {
                return Err(StorageError::Unavailable(
                    "memory storage writes disabled".to_string(),
                ))
            }
            Some(WriteFailure::QuotaExceeded) => return Err(StorageError::QuotaExceeded),
            None => {}
        }

        let document = serde_json::to_string(pages)
            .map_err(|err| StorageError::Unavailable(format!("failed to encode pages: {err}")))?;
        state.document = Some(document);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
