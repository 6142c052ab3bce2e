
use aria_core::storage::{
    load_json, save_json, KeyValueStore, EQUALIZER_SETTINGS_KEY, PLAYBACK_PREFERENCES_KEY,
    QUEUE_STATE_KEY,
};
use aria_storage::SqliteKeyValueStore;
use test_helpers::TestDb;

#[tokio::test]
async fn test_get_missing_key() {
    let db = TestDb::new().await;
    let store = SqliteKeyValueStore::new(db.pool().clone());

    assert_eq!(store.get(QUEUE_STATE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_set_and_get() {
    let db = TestDb::new().await;
    let store = SqliteKeyValueStore::new(db.pool().clone());

    store
        .set(PLAYBACK_PREFERENCES_KEY, r#"{"repeatMode":"all"}"#.to_string())
        .await
        .unwrap();

    let value = store.get(PLAYBACK_PREFERENCES_KEY).await.unwrap();
    assert_eq!(value.as_deref(), Some(r#"{"repeatMode":"all"}"#));
}

#[tokio::test]
async fn test_overwrite_replaces_value() {
    let db = TestDb::new().await;
    let store = SqliteKeyValueStore::new(db.pool().clone());

    store.set(QUEUE_STATE_KEY, "first".to_string()).await.unwrap();
    store.set(QUEUE_STATE_KEY, "second".to_string()).await.unwrap();

    assert_eq!(
        store.get(QUEUE_STATE_KEY).await.unwrap().as_deref(),
        Some("second")
    );
    assert_eq!(store.keys().await.unwrap(), vec![QUEUE_STATE_KEY.to_string()]);
}

#[tokio::test]
async fn test_remove() {
    let db = TestDb::new().await;
    let store = SqliteKeyValueStore::new(db.pool().clone());

    store.set("k", "v".to_string()).await.unwrap();
    assert!(store.delete_value("k").await.unwrap());
    assert!(!store.delete_value("k").await.unwrap());

    // Removing an absent key through the trait is not an error
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_json_helpers_over_sqlite() {
    let db = TestDb::new().await;
    let store = SqliteKeyValueStore::new(db.pool().clone());

    let gains = vec![0.0f32, 3.5, -12.0];
    save_json(&store, EQUALIZER_SETTINGS_KEY, &gains).await.unwrap();

    let loaded: Option<Vec<f32>> = load_json(&store, EQUALIZER_SETTINGS_KEY).await.unwrap();
    assert_eq!(loaded, Some(gains));
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let db = TestDb::new().await;
    {
        let store = SqliteKeyValueStore::new(db.pool().clone());
        store
            .set(QUEUE_STATE_KEY, serde_json::json!({"current": 2}).to_string())
            .await
            .unwrap();
    }

    let reopened = aria_storage::create_pool(&db.url).await.unwrap();
    aria_storage::run_migrations(&reopened).await.unwrap();
    let store = SqliteKeyValueStore::new(reopened);

    let raw = store.get(QUEUE_STATE_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["current"], 2);
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = TestDb::new().await;
    aria_storage::run_migrations(db.pool()).await.unwrap();
}
