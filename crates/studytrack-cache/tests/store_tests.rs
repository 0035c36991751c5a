//! Integration tests for SqliteLocalStore
//!
//! Each test creates a fresh in-memory database so tests stay isolated.

use studytrack_cache::{DatabasePool, SqliteLocalStore};
use studytrack_core::ports::{store_keys, ILocalStore};

// ============================================================================
// Test helpers
// ============================================================================

async fn setup(namespace: &str) -> (DatabasePool, SqliteLocalStore) {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let store = pool.store(namespace);
    (pool, store)
}

// ============================================================================
// get / set / remove
// ============================================================================

#[tokio::test]
async fn test_get_missing_key_returns_none() {
    let (_pool, store) = setup("default").await;
    assert_eq!(store.get(store_keys::ASSIGNMENTS).await.unwrap(), None);
}

#[tokio::test]
async fn test_set_then_get() {
    let (_pool, store) = setup("default").await;
    store.set(store_keys::COURSES, "[]").await.unwrap();
    assert_eq!(
        store.get(store_keys::COURSES).await.unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn test_set_overwrites_previous_value() {
    let (_pool, store) = setup("default").await;
    store.set(store_keys::LAST_SYNC_TIME, "2026-01-01T00:00:00Z").await.unwrap();
    store.set(store_keys::LAST_SYNC_TIME, "2026-02-01T00:00:00Z").await.unwrap();
    assert_eq!(
        store.get(store_keys::LAST_SYNC_TIME).await.unwrap().as_deref(),
        Some("2026-02-01T00:00:00Z")
    );
    assert_eq!(store.keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_deletes_key() {
    let (_pool, store) = setup("default").await;
    store.set(store_keys::DELETED_ASSIGNMENT_IDS, r#"["a1"]"#).await.unwrap();
    store.remove(store_keys::DELETED_ASSIGNMENT_IDS).await.unwrap();
    assert_eq!(store.get(store_keys::DELETED_ASSIGNMENT_IDS).await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_missing_key_is_ok() {
    let (_pool, store) = setup("default").await;
    store.remove("never-set").await.unwrap();
}

// ============================================================================
// Namespaces
// ============================================================================

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let (pool, alice) = setup("alice").await;
    let bob = pool.store("bob");

    alice.set(store_keys::ASSIGNMENTS, r#"[{"id":"a1"}]"#).await.unwrap();
    assert_eq!(bob.get(store_keys::ASSIGNMENTS).await.unwrap(), None);

    bob.set(store_keys::ASSIGNMENTS, "[]").await.unwrap();
    assert_eq!(
        alice.get(store_keys::ASSIGNMENTS).await.unwrap().as_deref(),
        Some(r#"[{"id":"a1"}]"#)
    );
}

#[tokio::test]
async fn test_keys_and_clear() {
    let (pool, store) = setup("alice").await;
    let other = pool.store("bob");

    store.set(store_keys::COURSES, "[]").await.unwrap();
    store.set(store_keys::ASSIGNMENTS, "[]").await.unwrap();
    other.set(store_keys::COURSES, "[]").await.unwrap();

    assert_eq!(
        store.keys().await.unwrap(),
        vec![store_keys::ASSIGNMENTS.to_string(), store_keys::COURSES.to_string()]
    );

    assert_eq!(store.clear().await.unwrap(), 2);
    assert!(store.keys().await.unwrap().is_empty());
    assert_eq!(other.keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_namespaces_lists_profiles_with_data() {
    let (pool, alice) = setup("alice").await;
    assert!(pool.namespaces().await.unwrap().is_empty());

    alice.set(store_keys::COURSES, "[]").await.unwrap();
    pool.store("bob").set(store_keys::COURSES, "[]").await.unwrap();
    assert_eq!(pool.namespaces().await.unwrap(), vec!["alice", "bob"]);

    alice.clear().await.unwrap();
    assert_eq!(pool.namespaces().await.unwrap(), vec!["bob"]);
}

// ============================================================================
// File-backed pool
// ============================================================================

#[tokio::test]
async fn test_file_database_persists_across_pools() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("studytrack.db");

    {
        let pool = DatabasePool::new(&db_path).await.unwrap();
        let store = pool.store("default");
        store.set(store_keys::COURSES, r#"[{"id":"c1","name":"Art"}]"#).await.unwrap();
        pool.pool().close().await;
    }

    let pool = DatabasePool::new(&db_path).await.unwrap();
    let store = pool.store("default");
    assert_eq!(
        store.get(store_keys::COURSES).await.unwrap().as_deref(),
        Some(r#"[{"id":"c1","name":"Art"}]"#)
    );
}
