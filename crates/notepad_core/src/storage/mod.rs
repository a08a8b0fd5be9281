//! Persistence port and storage backends.
//!
//! # Responsibility
//! - Define the load/save contract that decouples the page store from its
//!   storage medium.
//! - Provide interchangeable local (SQLite key/value), in-memory and remote
//!   HTTP implementations.
//!
//! # Invariants
//! - Backends persist the full record shape, derived fields included.
//! - Timestamps round-trip exactly through every backend.
//! - Backends never panic on unreadable or corrupt data; they return
//!   `StorageError` or degrade to an empty collection.
//!
//! # See also
//! - docs/architecture/storage.md

use crate::db::DbError;
use crate::model::page::{Page, PageId, PageUpdate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod remote;
pub mod sqlite_kv;

pub use memory::MemoryStorage;
pub use remote::RemoteApiStorage;
pub use sqlite_kv::{SqliteKvStorage, DEFAULT_STORAGE_KEY};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure taxonomy shared by every storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// Medium cannot be read or written.
    Unavailable(String),
    /// Medium rejected the write for lack of space.
    QuotaExceeded,
    /// Operation referenced a page the backend does not know.
    NotFound(PageId),
    /// Remote backend answered with a non-2xx status.
    RemoteRequestFailed {
        operation: &'static str,
        status: u16,
    },
    /// Local database bootstrap or query failure.
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "storage unavailable: {details}"),
            Self::QuotaExceeded => write!(f, "storage quota exceeded"),
            Self::NotFound(page_id) => write!(f, "page not found in storage: {page_id}"),
            Self::RemoteRequestFailed { operation, status } => {
                write!(f, "remote request `{operation}` failed with status {status}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        if value.is_storage_full() {
            Self::QuotaExceeded
        } else {
            Self::Db(value)
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

/// One store mutation, handed to the port next to the full collection.
#[derive(Debug, Clone, Copy)]
pub enum PageChange<'a> {
    Created(&'a Page),
    /// `page` is the record after `update` was applied.
    Updated {
        page: &'a Page,
        update: &'a PageUpdate,
    },
    Deleted(&'a PageId),
}

impl PageChange<'_> {
    pub fn page_id(&self) -> &PageId {
        match self {
            Self::Created(page) | Self::Updated { page, .. } => page.id(),
            Self::Deleted(page_id) => *page_id,
        }
    }

    /// Stable name used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted(_) => "deleted",
        }
    }
}

/// Load/save contract between the page store and a storage medium.
pub trait PageStorage {
    /// Loads the full page collection in stored order.
    fn load(&self) -> StorageResult<Vec<Page>>;

    /// Replaces the stored collection with `pages`.
    fn save_all(&self, pages: &[Page]) -> StorageResult<()>;

    /// Persists one store mutation.
    ///
    /// `pages` is the collection after the change. Snapshot backends keep
    /// this default; per-record backends map `change` to their own verbs.
    fn apply_change(&self, change: &PageChange<'_>, pages: &[Page]) -> StorageResult<()> {
        let _ = change;
        self.save_all(pages)
    }

    /// Short backend name used in log events.
    fn backend_name(&self) -> &'static str;
}

impl<S: PageStorage + ?Sized> PageStorage for Box<S> {
    fn load(&self) -> StorageResult<Vec<Page>> {
        (**self).load()
    }

    fn save_all(&self, pages: &[Page]) -> StorageResult<()> {
        (**self).save_all(pages)
    }

    fn apply_change(&self, change: &PageChange<'_>, pages: &[Page]) -> StorageResult<()> {
        (**self).apply_change(change, pages)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
