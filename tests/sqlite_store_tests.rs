//! Durable session store behavior against a real SQLite file.

use resumable_upload::{SessionStore, SqliteSessionStore, UploadSession};

fn session(id: &str, owner: &str, file_size: u64) -> UploadSession {
    UploadSession::new(
        id.into(),
        format!("remote-{id}"),
        "stored-name.bin".into(),
        "name.bin".into(),
        file_size,
        "application/octet-stream".into(),
        owner.into(),
        Some("folder-9".into()),
        10,
    )
}

async fn open_store(dir: &tempfile::TempDir) -> SqliteSessionStore {
    SqliteSessionStore::connect(dir.path().join("uploads.db"))
        .await
        .unwrap()
}

#[tokio::test]
async fn round_trips_a_session_with_parts() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let mut original = session("fp-1", "owner-1", 25);
    original.parts[0].mark_uploaded("abc123".into());
    original.cursor = 1;
    store.put(&original).await.unwrap();

    let loaded = store.get("fp-1").await.unwrap().unwrap();
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.remote_object_id, "remote-fp-1");
    assert_eq!(loaded.file_size, 25);
    assert_eq!(loaded.part_size, 10);
    assert_eq!(loaded.cursor, 1);
    assert_eq!(loaded.destination_folder_id.as_deref(), Some("folder-9"));
    assert_eq!(loaded.parts.len(), 3);
    assert!(loaded.parts[0].uploaded);
    assert_eq!(loaded.parts[0].checksum.as_deref(), Some("abc123"));
    assert!(!loaded.parts[1].uploaded);
}

#[tokio::test]
async fn put_overwrites_the_whole_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let mut s = session("fp-1", "owner-1", 25);
    store.put(&s).await.unwrap();
    s.parts[0].mark_uploaded("aa".into());
    s.parts[1].mark_uploaded("bb".into());
    s.cursor = 2;
    s.touch();
    store.put(&s).await.unwrap();

    let loaded = store.get("fp-1").await.unwrap().unwrap();
    assert_eq!(loaded.uploaded_parts(), 2);
    assert_eq!(loaded.cursor, 2);
}

#[tokio::test]
async fn get_of_unknown_id_is_none_on_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    assert!(store.get("nope").await.unwrap().is_none());
    assert!(store.list_by_owner("owner-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    store.put(&session("fp-1", "owner-1", 25)).await.unwrap();
    store.delete("fp-1").await.unwrap();
    assert!(store.get("fp-1").await.unwrap().is_none());
    store.delete("fp-1").await.unwrap();
}

#[tokio::test]
async fn listing_and_clearing_scope_to_the_owner() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    store.put(&session("fp-1", "owner-1", 25)).await.unwrap();
    store.put(&session("fp-2", "owner-1", 40)).await.unwrap();
    store.put(&session("fp-3", "owner-2", 15)).await.unwrap();

    let mine = store.list_by_owner("owner-1").await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|s| s.owner_id == "owner-1"));

    store.clear_owner("owner-1").await.unwrap();
    assert!(store.list_by_owner("owner-1").await.unwrap().is_empty());
    assert_eq!(store.list_by_owner("owner-2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn sessions_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open_store(&dir).await;
        let mut s = session("fp-1", "owner-1", 25);
        s.parts[0].mark_uploaded("aa".into());
        store.put(&s).await.unwrap();
    }

    // A second connect sees the same record; migrate is idempotent.
    let store = open_store(&dir).await;
    let loaded = store.get("fp-1").await.unwrap().unwrap();
    assert_eq!(loaded.uploaded_parts(), 1);
}
