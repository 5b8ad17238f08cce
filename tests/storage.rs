use backup_sphere::core::storage::local::LocalStorage;
use backup_sphere::core::storage::object::ObjectStorage;
use backup_sphere::interface::storage_adapter::StorageAdapter;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn deleting_absent_keys_succeeds_everywhere() {
    let dir = TempDir::new().unwrap();
    let adapters: Vec<Box<dyn StorageAdapter>> = vec![
        Box::new(LocalStorage::new("local", dir.path().join("store"))),
        Box::new(ObjectStorage::in_memory("memory")),
    ];

    for adapter in &adapters {
        assert!(adapter.delete("never_stored.tar.gz").await.is_ok(), "{}", adapter.name());
        assert!(!adapter.exists("never_stored.tar.gz").await.unwrap());
    }
}

#[tokio::test]
async fn delete_is_repeatable_after_store() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("nightly.tar.zip");
    fs::write(&artifact, b"archive").unwrap();
    let storage = ObjectStorage::in_memory("memory");

    storage.store(&artifact, "nightly.tar.zip").await.unwrap();
    assert_eq!(storage.size("nightly.tar.zip").await.unwrap(), Some(7));

    storage.delete("nightly.tar.zip").await.unwrap();
    storage.delete("nightly.tar.zip").await.unwrap();
    assert!(storage.list().await.unwrap().is_empty());
}
