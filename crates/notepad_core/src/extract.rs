//! Inline marker extraction.
//!
//! # Responsibility
//! - Derive `#tag` names and `@place` markers from raw page content.
//!
//! # Invariants
//! - Extraction is a pure function of its input; identical content always
//!   yields identical output, place ids included.
//! - Word characters are ASCII letters, digits and underscore.
//! - Tags are lowercased; occurrence order and duplicates are preserved.
//! - Place names may contain single spaces between word groups; two spaces,
//!   any other whitespace, punctuation or end of text terminate the name.

use crate::model::page::PlaceMarker;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("valid tag regex"));
static PLACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z0-9_]+(?: [A-Za-z0-9_]+)*)").expect("valid place regex")
});

const PLACE_ID_PREFIX: &str = "place-";

/// Extracts lowercase tag names from `#word` tokens.
///
/// Returns an empty vec when content has no tags.
pub fn extract_tags(content: &str) -> Vec<String> {
    TAG_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Extracts place markers from `@name` tokens.
///
/// Marker ids are `place-<n>` where `n` is the 0-based match index, so they
/// are unique within one call but not a global identity.
pub fn extract_places(content: &str) -> Vec<PlaceMarker> {
    PLACE_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .enumerate()
        .map(|(index, m)| PlaceMarker::new(format!("{PLACE_ID_PREFIX}{index}"), m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{extract_places, extract_tags};

    fn place_names(content: &str) -> Vec<String> {
        extract_places(content)
            .into_iter()
            .map(|place| place.name)
            .collect()
    }

    #[test]
    fn tags_are_lowercased_and_keep_duplicates_in_order() {
        assert_eq!(
            extract_tags("Met #Bob at #CAFE #bob"),
            vec!["bob".to_string(), "cafe".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn tags_empty_for_plain_or_empty_content() {
        assert!(extract_tags("").is_empty());
        assert!(extract_tags("no markers here").is_empty());
        assert!(extract_tags("lonely # sign").is_empty());
    }

    #[test]
    fn tags_stop_at_non_word_characters() {
        assert_eq!(
            extract_tags("#rust-lang, #2024! #snake_case."),
            vec![
                "rust".to_string(),
                "2024".to_string(),
                "snake_case".to_string()
            ]
        );
    }

    #[test]
    fn tags_only_contain_lowercase_word_characters() {
        let content = "#Alpha #BETA_2 #gamma#Delta ##x #é";
        for tag in extract_tags(content) {
            assert!(!tag.is_empty());
            assert!(tag
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'));
            assert!(content.to_ascii_lowercase().contains(&format!("#{tag}")));
        }
    }

    #[test]
    fn single_word_place() {
        assert_eq!(place_names("coffee @Lisbon."), vec!["Lisbon".to_string()]);
    }

    #[test]
    fn multi_word_place_continues_across_single_spaces() {
        assert_eq!(
            place_names("Lunch @Central Park today"),
            vec!["Central Park today".to_string()]
        );
    }

    #[test]
    fn multi_word_place_stops_at_punctuation() {
        assert_eq!(
            place_names("Lunch @Central Park, today"),
            vec!["Central Park".to_string()]
        );
    }

    #[test]
    fn multi_word_place_stops_at_double_space_and_newline() {
        assert_eq!(
            place_names("Lunch @Central Park  today"),
            vec!["Central Park".to_string()]
        );
        assert_eq!(
            place_names("@Home Office\nnext line"),
            vec!["Home Office".to_string()]
        );
    }

    #[test]
    fn places_get_batch_local_ids_and_no_enrichment() {
        let places = extract_places("@Paris then @Rome");
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].id, "place-0");
        assert_eq!(places[1].id, "place-1");
        assert_eq!(places[0].name, "Paris then");
        assert_eq!(places[1].name, "Rome");
        assert!(places.iter().all(|place| place.coordinates.is_none()));
        assert!(places.iter().all(|place| place.address.is_none()));
    }

    #[test]
    fn extraction_is_idempotent() {
        let content = "#Work sync @Main Office, then #work again @Cafe";
        assert_eq!(extract_tags(content), extract_tags(content));
        assert_eq!(extract_places(content), extract_places(content));
    }

    #[test]
    fn places_empty_without_markers() {
        assert!(extract_places("").is_empty());
        assert!(extract_places("mail me at @ home").is_empty());
    }
}
