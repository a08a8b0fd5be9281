//! Page store use-case service.
//!
//! # Responsibility
//! - Own the page collection, the current selection and the storage port.
//! - Derive tags/places on content writes and the tag index on reads.
//! - Notify subscribers about every state change.
//!
//! # Invariants
//! - All mutation goes through store operations; callers only get shared
//!   references to pages.
//! - In-memory state is updated before persistence is attempted; storage
//!   failures are logged and never roll back or block the caller.
//! - Unknown page ids are silent no-ops.
//! - Deleting the selected page clears the selection without picking
//!   another page.
//!
//! # See also
//! - docs/architecture/page-store.md

use crate::model::page::{Page, PageId, PageUpdate};
use crate::model::tag_index::TagIndex;
use crate::storage::{PageChange, PageStorage, StorageError};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};

/// State change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Created(PageId),
    Updated(PageId),
    Deleted(PageId),
    SelectionChanged(Option<PageId>),
}

/// Single owner of the page collection.
pub struct PageStore<S: PageStorage> {
    storage: S,
    pages: Vec<Page>,
    current_page_id: Option<PageId>,
    subscribers: Vec<Sender<PageEvent>>,
}

impl<S: PageStorage> PageStore<S> {
    /// Creates a store and loads the persisted collection.
    ///
    /// A failing load is logged and the store starts empty.
    pub fn open(storage: S) -> Self {
        let pages = match storage.load() {
            Ok(pages) => {
                info!(
                    "event=store_open module=store status=ok backend={} pages={}",
                    storage.backend_name(),
                    pages.len()
                );
                pages
            }
            Err(err) => {
                error!(
                    "event=store_open module=store status=error backend={} error_code=load_failed error={}",
                    storage.backend_name(),
                    err
                );
                Vec::new()
            }
        };

        Self {
            storage,
            pages,
            current_page_id: None,
            subscribers: Vec::new(),
        }
    }

    /// Creates an empty page, persists it and selects it.
    pub fn create_page(&mut self) -> PageId {
        let page = Page::new();
        let page_id = page.id().clone();
        let index = self.pages.len();
        self.pages.push(page);
        self.persist(PageChange::Created(&self.pages[index]));

        info!(
            "event=page_create module=store status=ok pages={}",
            self.pages.len()
        );
        self.emit(PageEvent::Created(page_id.clone()));
        self.set_selection(Some(page_id.clone()));
        page_id
    }

    /// Applies a partial update to one page.
    ///
    /// Title is replaced when present. Tags and places are recomputed only
    /// when `update.content` is present, so title-only edits keep whatever
    /// derived fields the stored record carries. `updated_at` moves on every
    /// applied call. Returns `None` for an unknown id.
    pub fn update_page(&mut self, page_id: &PageId, update: PageUpdate) -> Option<&Page> {
        let Some(index) = self.position(page_id) else {
            debug!("event=page_update module=store status=skipped error_code=page_not_found");
            return None;
        };

        self.pages[index].apply(&update, Utc::now());
        self.persist(PageChange::Updated {
            page: &self.pages[index],
            update: &update,
        });

        debug!(
            "event=page_update module=store status=ok title_changed={} content_changed={}",
            update.title.is_some(),
            update.content.is_some()
        );
        self.emit(PageEvent::Updated(page_id.clone()));
        Some(&self.pages[index])
    }

    /// Removes one page. Returns `false` for an unknown id.
    pub fn delete_page(&mut self, page_id: &PageId) -> bool {
        let Some(index) = self.position(page_id) else {
            debug!("event=page_delete module=store status=skipped error_code=page_not_found");
            return false;
        };

        self.pages.remove(index);
        self.persist(PageChange::Deleted(page_id));

        info!(
            "event=page_delete module=store status=ok pages={}",
            self.pages.len()
        );
        self.emit(PageEvent::Deleted(page_id.clone()));
        if self.current_page_id.as_ref() == Some(page_id) {
            self.set_selection(None);
        }
        true
    }

    /// Pages carrying `tag`, in collection order and without duplicates.
    ///
    /// `tag` is matched exactly against the lowercase index keys.
    pub fn pages_by_tag(&self, tag: &str) -> Vec<&Page> {
        let index = self.tag_index();
        let page_ids = index.page_ids(tag);
        if page_ids.is_empty() {
            return Vec::new();
        }
        self.pages
            .iter()
            .filter(|page| page_ids.contains(page.id()))
            .collect()
    }

    /// Tag index recomputed from the current collection.
    pub fn tag_index(&self) -> TagIndex {
        TagIndex::build(&self.pages)
    }

    /// All pages in collection order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, page_id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|page| page.id() == page_id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_page_id(&self) -> Option<&PageId> {
        self.current_page_id.as_ref()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page_id
            .as_ref()
            .and_then(|page_id| self.page(page_id))
    }

    /// Selects an existing page. Returns `false` for an unknown id.
    pub fn select_page(&mut self, page_id: &PageId) -> bool {
        if self.position(page_id).is_none() {
            return false;
        }
        if self.current_page_id.as_ref() != Some(page_id) {
            self.set_selection(Some(page_id.clone()));
        }
        true
    }

    pub fn clear_selection(&mut self) {
        if self.current_page_id.is_some() {
            self.set_selection(None);
        }
    }

    /// Registers a change listener.
    ///
    /// Dropping the receiver unsubscribes it on the next emitted event.
    pub fn subscribe(&mut self) -> Receiver<PageEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn position(&self, page_id: &PageId) -> Option<usize> {
        self.pages.iter().position(|page| page.id() == page_id)
    }

    fn set_selection(&mut self, page_id: Option<PageId>) {
        self.current_page_id = page_id.clone();
        self.emit(PageEvent::SelectionChanged(page_id));
    }

    fn emit(&mut self, event: PageEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn persist(&self, change: PageChange<'_>) {
        let backend = self.storage.backend_name();
        match self.storage.apply_change(&change, &self.pages) {
            Ok(()) => debug!(
                "event=store_persist module=store status=ok backend={} change={}",
                backend,
                change.kind()
            ),
            Err(StorageError::NotFound(_)) => debug!(
                "event=store_persist module=store status=skipped backend={} change={} error_code=not_found",
                backend,
                change.kind()
            ),
            Err(StorageError::QuotaExceeded) => warn!(
                "event=store_persist module=store status=error backend={} change={} error_code=quota_exceeded",
                backend,
                change.kind()
            ),
            Err(err) => error!(
                "event=store_persist module=store status=error backend={} change={} error_code=persist_failed error={}",
                backend,
                change.kind(),
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PageEvent, PageStore};
    use crate::model::page::{PageId, PageUpdate};
    use crate::storage::MemoryStorage;

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut store = PageStore::open(MemoryStorage::new());
        let kept = store.subscribe();
        drop(store.subscribe());

        store.create_page();
        assert_eq!(store.subscribers.len(), 1);
        assert!(matches!(kept.try_recv(), Ok(PageEvent::Created(_))));
    }

    #[test]
    fn select_unknown_page_keeps_selection() {
        let mut store = PageStore::open(MemoryStorage::new());
        let page_id = store.create_page();
        assert!(!store.select_page(&PageId::from("missing")));
        assert_eq!(store.current_page_id(), Some(&page_id));
    }

    #[test]
    fn empty_update_still_touches_timestamp() {
        let mut store = PageStore::open(MemoryStorage::new());
        let page_id = store.create_page();
        let before = store.page(&page_id).unwrap().updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));

        let updated = store.update_page(&page_id, PageUpdate::default()).unwrap();
        assert!(updated.updated_at() > before);
    }
}
