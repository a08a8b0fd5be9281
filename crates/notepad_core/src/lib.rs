//! Core domain logic for the notepad.
//! This crate owns pages, their derived tags/places and persistence; UI
//! shells consume it through `PageStore`.

pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use config::{open_storage, ConfigError, StorageConfig};
pub use extract::{extract_places, extract_tags};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::page::{Coordinates, Page, PageId, PageUpdate, PlaceMarker, UNTITLED_PAGE_TITLE};
pub use model::tag_index::TagIndex;
pub use service::page_store::{PageEvent, PageStore};
pub use storage::{
    MemoryStorage, PageChange, PageStorage, RemoteApiStorage, SqliteKvStorage, StorageError,
    StorageResult, DEFAULT_STORAGE_KEY,
};

/// Page store over whichever backend `StorageConfig` selected.
pub type ConfiguredPageStore = PageStore<Box<dyn PageStorage>>;

/// Builds the configured backend and opens a store on it.
pub fn open_page_store(config: &StorageConfig) -> StorageResult<ConfiguredPageStore> {
    Ok(PageStore::open(open_storage(config)?))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
