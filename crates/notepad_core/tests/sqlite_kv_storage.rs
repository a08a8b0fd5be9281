use notepad_core::db::migrations::{current_user_version, latest_version};
use notepad_core::db::{open_db, open_db_in_memory, DbError};
use notepad_core::{
    Coordinates, Page, PageStorage, PageStore, PageUpdate, SqliteKvStorage, StorageError,
    DEFAULT_STORAGE_KEY,
};
use rusqlite::Connection;

fn sample_pages() -> Vec<Page> {
    let mut first = Page::new();
    first.title = "Weekend".to_string();
    first.set_content("Hike with #Friends near @Mount Tam, then #food");

    let mut second = Page::new();
    second.title = String::new();
    second.set_content("no markers");

    vec![first, second]
}

#[test]
fn migrations_create_kv_table_and_record_version() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());

    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
            .unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedSchemaVersion { .. }));
    assert!(SqliteKvStorage::open(&path).is_err());
}

#[test]
fn empty_database_loads_empty_collection() {
    let storage = SqliteKvStorage::open_in_memory().unwrap();
    assert_eq!(storage.key(), DEFAULT_STORAGE_KEY);
    assert!(storage.load().unwrap().is_empty());
    assert!(storage.raw_value().unwrap().is_none());
}

#[test]
fn save_and_load_roundtrip_preserves_every_field() {
    let storage = SqliteKvStorage::open_in_memory().unwrap();
    let mut pages = sample_pages();
    let mut enriched = Page::new();
    enriched.set_content("@Ferry Building");
    pages.push(enriched);

    storage.save_all(&pages).unwrap();
    let loaded = storage.load().unwrap();

    assert_eq!(loaded, pages);
    assert_eq!(loaded[0].created_at(), pages[0].created_at());
    assert_eq!(loaded[0].updated_at(), pages[0].updated_at());
    assert_eq!(loaded[0].tags(), ["friends".to_string(), "food".to_string()]);
    assert_eq!(loaded[0].places()[0].name, "Mount Tam");
}

#[test]
fn enrichment_fields_survive_roundtrip() {
    let storage = SqliteKvStorage::open_in_memory().unwrap();
    let json = r#"[{
        "id": "page-enriched",
        "title": "Bridge",
        "content": "@Golden Gate",
        "tags": [],
        "places": [{
            "id": "place-0",
            "name": "Golden Gate",
            "coordinates": {"lat": 37.8199, "lng": -122.4783},
            "address": "Golden Gate Bridge, San Francisco"
        }],
        "createdAt": "2024-05-01T10:00:00.123Z",
        "updatedAt": "2024-05-02T11:30:00.456Z"
    }]"#;
    storage.write_raw_value(json).unwrap();

    let loaded = storage.load().unwrap();
    let place = &loaded[0].places()[0];
    assert_eq!(
        place.coordinates,
        Some(Coordinates {
            lat: 37.8199,
            lng: -122.4783
        })
    );
    assert_eq!(
        place.address.as_deref(),
        Some("Golden Gate Bridge, San Francisco")
    );

    storage.save_all(&loaded).unwrap();
    assert_eq!(storage.load().unwrap(), loaded);
}

#[test]
fn stored_document_uses_camel_case_iso_timestamps() {
    let storage = SqliteKvStorage::open_in_memory().unwrap();
    storage.save_all(&sample_pages()).unwrap();

    let raw = storage.raw_value().unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value[0];
    assert!(record["createdAt"].as_str().unwrap().contains('T'));
    assert!(record["updatedAt"].is_string());
    assert!(record["tags"].is_array());
    assert!(record["places"][0].get("coordinates").is_none());
    assert!(record["places"][0].get("address").is_none());
}

#[test]
fn malformed_document_loads_as_empty() {
    let storage = SqliteKvStorage::open_in_memory().unwrap();
    storage.write_raw_value("[{\"id\": 42").unwrap();
    assert!(storage.load().unwrap().is_empty());
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let (page_id, expected) = {
        let mut store = PageStore::open(SqliteKvStorage::open(&path).unwrap());
        let page_id = store.create_page();
        store.update_page(
            &page_id,
            PageUpdate::title("Persisted").with_content("#durable entry"),
        );
        (page_id, store.pages().to_vec())
    };

    let store = PageStore::open(SqliteKvStorage::open(&path).unwrap());
    assert_eq!(store.pages(), expected.as_slice());
    assert_eq!(store.pages_by_tag("durable")[0].id(), &page_id);
}

#[test]
fn from_connection_applies_migrations() {
    let conn = Connection::open_in_memory().unwrap();
    let storage = SqliteKvStorage::from_connection(conn).unwrap();
    storage.save_all(&sample_pages()).unwrap();
    assert_eq!(storage.load().unwrap().len(), 2);
}

#[test]
fn unreadable_medium_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SqliteKvStorage::open(dir.path()).err().unwrap();
    assert!(matches!(err, StorageError::Db(_)));
}
