//! Derived tag -> page lookup.
//!
//! # Invariants
//! - Built from a full page collection; never patched incrementally.
//! - Every tag of every page is a key, and each page id appears at most once
//!   per tag regardless of how often the tag occurs in the page content.
//! - Keys iterate in ascending order.

use crate::model::page::{Page, PageId};
use std::collections::BTreeMap;

/// Mapping from tag name to the ids of pages carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    entries: BTreeMap<String, Vec<PageId>>,
}

impl TagIndex {
    /// Builds the index from the given pages, preserving their order inside
    /// each entry.
    pub fn build<'a>(pages: impl IntoIterator<Item = &'a Page>) -> Self {
        let mut entries: BTreeMap<String, Vec<PageId>> = BTreeMap::new();
        for page in pages {
            for tag in page.tags() {
                let ids = entries.entry(tag.clone()).or_default();
                if !ids.contains(page.id()) {
                    ids.push(page.id().clone());
                }
            }
        }
        Self { entries }
    }

    /// Page ids for `tag`; empty when the tag is unknown.
    pub fn page_ids(&self, tag: &str) -> &[PageId] {
        self.entries.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, tag: &str, page_id: &PageId) -> bool {
        self.page_ids(tag).contains(page_id)
    }

    /// Number of distinct pages carrying `tag`.
    pub fn page_count(&self, tag: &str) -> usize {
        self.page_ids(tag).len()
    }

    /// All known tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(tag, page_count)` pairs, most used first, ties broken by name.
    pub fn frequencies(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .entries
            .iter()
            .map(|(tag, ids)| (tag.as_str(), ids.len()))
            .collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        ranked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PageId])> {
        self.entries
            .iter()
            .map(|(tag, ids)| (tag.as_str(), ids.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::TagIndex;
    use crate::model::page::Page;

    fn page_with(content: &str) -> Page {
        let mut page = Page::new();
        page.set_content(content);
        page
    }

    #[test]
    fn repeated_tag_in_one_page_is_indexed_once() {
        let page = page_with("#x and again #X and #x");
        let index = TagIndex::build([&page]);
        assert_eq!(index.page_ids("x"), std::slice::from_ref(page.id()));
        assert_eq!(index.page_count("x"), 1);
    }

    #[test]
    fn every_page_tag_is_a_key() {
        let pages = vec![page_with("#a #b"), page_with("#b #c"), page_with("plain")];
        let index = TagIndex::build(&pages);

        for page in &pages {
            for tag in page.tags() {
                assert!(index.contains(tag, page.id()));
            }
        }
        assert_eq!(index.tags().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn entries_follow_collection_order() {
        let first = page_with("#shared");
        let second = page_with("#shared");
        let index = TagIndex::build([&first, &second]);
        assert_eq!(
            index.page_ids("shared"),
            &[first.id().clone(), second.id().clone()]
        );
    }

    #[test]
    fn unknown_tag_has_no_pages() {
        let index = TagIndex::build(&[page_with("#a")]);
        assert!(index.page_ids("missing").is_empty());
        assert_eq!(index.page_count("missing"), 0);
    }

    #[test]
    fn frequencies_rank_by_count_then_name() {
        let pages = vec![
            page_with("#rust #notes"),
            page_with("#rust #zeta"),
            page_with("#rust #notes #alpha"),
        ];
        let index = TagIndex::build(&pages);
        assert_eq!(
            index.frequencies(),
            vec![("rust", 3), ("notes", 2), ("alpha", 1), ("zeta", 1)]
        );
    }

    #[test]
    fn empty_collection_builds_empty_index() {
        let index = TagIndex::build(std::iter::empty());
        assert!(index.is_empty());
        assert!(index.frequencies().is_empty());
    }
}
