use super::*;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("rigbuild-storage-{}", uuid::Uuid::new_v4()))
}

// =============================================================================
// MemoryStore
// =============================================================================

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("a").unwrap(), None);
    store.set("a", "1").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    store.remove("a").unwrap();
    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
}

#[test]
fn load_json_round_trips_through_save_json() {
    let store = MemoryStore::new();
    save_json(&store, "list", &vec![1, 2, 3]).unwrap();
    let loaded: Option<Vec<i32>> = load_json(&store, "list");
    assert_eq!(loaded, Some(vec![1, 2, 3]));
}

#[test]
fn load_json_corrupt_blob_is_none() {
    let store = MemoryStore::new();
    store.set("list", "{not json").unwrap();
    let loaded: Option<Vec<i32>> = load_json(&store, "list");
    assert!(loaded.is_none());
}

#[test]
fn save_json_reports_encode_failure() {
    let store = MemoryStore::new();
    let mut bad = std::collections::HashMap::new();
    bad.insert((1_u8, 2_u8), "tuple keys are not JSON keys");
    let err = save_json(&store, "bad", &bad).unwrap_err();
    assert!(matches!(err, StorageError::Encode { .. }));
    assert_eq!(store.get("bad").unwrap(), None);
}

// =============================================================================
// FileStore
// =============================================================================

#[test]
fn file_store_persists_across_instances() {
    let dir = temp_dir();
    {
        let store = FileStore::open(&dir).unwrap();
        store.set("history.v1", "[]").unwrap();
    }
    let reopened = FileStore::open(&dir).unwrap();
    assert_eq!(reopened.get("history.v1").unwrap().as_deref(), Some("[]"));
    assert!(dir.join("history.v1.json").exists());
    assert!(!dir.join("history.v1.json.tmp").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn file_store_missing_key_is_none() {
    let dir = temp_dir();
    let store = FileStore::open(&dir).unwrap();
    assert_eq!(store.get("absent").unwrap(), None);
    store.remove("absent").unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = temp_dir();
    let store = FileStore::open(&dir).unwrap();
    assert!(matches!(store.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    assert!(matches!(store.get(".hidden"), Err(StorageError::InvalidKey(_))));
    let _ = std::fs::remove_dir_all(&dir);
}
