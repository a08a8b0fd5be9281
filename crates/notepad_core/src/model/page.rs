//! Page domain model.
//!
//! # Responsibility
//! - Define the canonical note record persisted by every storage backend.
//! - Keep `tags`/`places` derived from `content` by construction.
//!
//! # Invariants
//! - `id` is stable and never reassigned after creation.
//! - `created_at` is written once; `updated_at` moves on every applied update.
//! - `tags` and `places` only change through `Page::set_content`, which
//!   recomputes both from the new content.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::extract::{extract_places, extract_tags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Title assigned to freshly created pages.
pub const UNTITLED_PAGE_TITLE: &str = "Untitled";

/// Stable identifier of a page.
///
/// Serialized as a bare string so records written by older clients with
/// non-UUID ids (`page-1718000000000`) keep loading.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Generates a fresh, globally unique page id.
    pub fn generate() -> Self {
        Self(format!("page-{}", Uuid::new_v4()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Geographic position attached to a place marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Location reference extracted from an `@name` token.
///
/// `coordinates` and `address` are never filled by extraction; they are
/// reserved for external enrichment and omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMarker {
    /// Unique within one extraction batch only.
    pub id: String,
    /// Text captured after `@`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl PlaceMarker {
    /// Creates a marker without location enrichment.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates: None,
            address: None,
        }
    }
}

/// A note document.
///
/// Derived fields are private with read-only accessors; the only write path
/// is `set_content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    id: PageId,
    pub title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    places: Vec<PlaceMarker>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Page {
    /// Creates an empty page with a generated id and placeholder title.
    ///
    /// # Invariants
    /// - `content`, `tags` and `places` start empty.
    /// - `created_at == updated_at`.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    /// Creates an empty page stamped with the provided creation time.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            id: PageId::generate(),
            title: UNTITLED_PAGE_TITLE.to_string(),
            content: String::new(),
            tags: Vec::new(),
            places: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Tags derived from `content`, in occurrence order (duplicates kept).
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Place markers derived from `content`, in occurrence order.
    pub fn places(&self) -> &[PlaceMarker] {
        &self.places
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `tag` occurs at least once in this page's tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }

    /// Replaces content and recomputes every derived field from it.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.tags = extract_tags(&self.content);
        self.places = extract_places(&self.content);
    }

    /// Applies a partial update and stamps `updated_at`.
    ///
    /// Derived fields are recomputed iff `update.content` is present; a
    /// title-only update keeps the existing tags/places as stored.
    pub fn apply(&mut self, update: &PageUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title.as_ref() {
            self.title = title.clone();
        }
        if let Some(content) = update.content.as_ref() {
            self.set_content(content.as_str());
        }
        self.updated_at = now;
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update request for `PageStore::update_page`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PageUpdate {
    /// Update touching only the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self::default().with_title(title)
    }

    /// Update touching only the content.
    pub fn content(content: impl Into<String>) -> Self {
        Self::default().with_content(content)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Returns whether neither field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}
