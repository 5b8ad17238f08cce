mod common;

use backup_sphere::core::adapter::filesystem::FilesystemAdapter;
use backup_sphere::core::backup_manager::BackupManager;
use backup_sphere::core::infrastructure::database_manager::DatabaseManager;
use backup_sphere::core::manager_config::ManagerConfig;
use backup_sphere::core::storage::local::LocalStorage;
use backup_sphere::model::backup_configuration::{BackupConfiguration, Options};
use backup_sphere::model::event::BackupEventKind;
use common::RecordingSink;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    sink: Arc<RecordingSink>,
}

impl Workspace {
    fn new() -> Self {
        let workspace = Self {
            dir: TempDir::new().unwrap(),
            sink: Arc::new(RecordingSink::default()),
        };
        let data = workspace.data();
        fs::create_dir_all(data.join("reports/2026")).unwrap();
        fs::write(data.join("readme.md"), "# data").unwrap();
        fs::write(data.join("reports/2026/q1.csv"), "quarter,total\nq1,42\n").unwrap();
        fs::write(data.join("reports/scratch.tmp"), "scratch").unwrap();
        fs::write(data.join("session.tmp"), "session").unwrap();
        workspace
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn data(&self) -> PathBuf {
        self.path("data")
    }

    fn manager_config(&self) -> ManagerConfig {
        ManagerConfig::new(self.path("work"))
            .with_adapter(Arc::new(FilesystemAdapter))
            .with_storage(Arc::new(LocalStorage::new("local", self.path("storage"))))
            .with_default_compressions()
            .with_event_sink(self.sink.clone())
    }

    fn nightly(&self) -> BackupConfiguration {
        BackupConfiguration::new("filesystem")
            .with_name("nightly")
            .with_compression("zip")
            .with_storage("local")
            .with_option("paths", json!([{ "path": self.data(), "exclude": ["*.tmp"] }]))
    }
}

fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn filesystem_backup_round_trips_through_zip_and_local_storage() {
    let workspace = Workspace::new();
    let manager = BackupManager::new(workspace.manager_config()).await.unwrap();

    let result = manager.backup(workspace.nightly()).await;

    assert!(result.is_success(), "{:?}", result.error());
    let key = result.file_path().unwrap();
    assert!(key.contains("nightly"));
    assert!(key.ends_with(".zip"));
    assert!(workspace.path("storage").join(key).is_file());
    assert!(manager.list_backups().iter().any(|record| record.id == result.id()));

    let target = workspace.path("restore");
    let mut options = Options::new();
    options.insert("target_dir".to_string(), json!(target));
    assert!(manager.restore(result.id(), &options).await);

    assert_eq!(files_under(&target), ["readme.md", "reports/2026/q1.csv"]);
    assert_eq!(
        fs::read_to_string(target.join("reports/2026/q1.csv")).unwrap(),
        "quarter,total\nq1,42\n"
    );
    assert_eq!(
        workspace.sink.kinds(),
        [
            BackupEventKind::PreBackup,
            BackupEventKind::PostBackup,
            BackupEventKind::PreRestore,
            BackupEventKind::PostRestore,
        ]
    );
    assert!(files_under(&workspace.path("work")).is_empty());
}

#[tokio::test]
async fn deleted_backup_is_gone_from_storage_and_index() {
    let workspace = Workspace::new();
    let manager = BackupManager::new(workspace.manager_config()).await.unwrap();
    let result = manager.backup(workspace.nightly()).await;
    let stored = workspace.path("storage").join(result.file_path().unwrap());
    assert!(stored.exists());

    assert!(manager.delete_backup(result.id()).await);

    assert!(!stored.exists());
    assert!(manager.get_backup(result.id()).is_none());
    assert!(manager.list_backups().is_empty());
    assert!(!manager.delete_backup(result.id()).await);
}

#[tokio::test]
async fn unsupported_type_fails_without_index_entry() {
    let workspace = Workspace::new();
    let manager = BackupManager::new(workspace.manager_config()).await.unwrap();

    let result = manager.backup(BackupConfiguration::new("mongodb")).await;

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("mongodb"));
    assert!(result.file_path().is_none());
    assert!(manager.list_backups().is_empty());
    assert_eq!(workspace.sink.kinds(), [BackupEventKind::BackupFailed]);
}

#[tokio::test]
async fn restore_without_target_dir_fails_cleanly() {
    let workspace = Workspace::new();
    let manager = BackupManager::new(workspace.manager_config()).await.unwrap();
    let result = manager.backup(workspace.nightly()).await;

    assert!(!manager.restore(result.id(), &Options::new()).await);

    let last = workspace.sink.last().unwrap();
    assert_eq!(last.kind, BackupEventKind::RestoreFailed);
    assert!(last.error.unwrap().contains("target_dir"));
    assert!(files_under(&workspace.path("work")).is_empty());
}

#[tokio::test]
async fn index_survives_restart() {
    let workspace = Workspace::new();
    let index = workspace.path("index/backups.db");

    let id = {
        let database_manager = Arc::new(DatabaseManager::new(&index).await.unwrap());
        let config = workspace
            .manager_config()
            .with_database_manager(database_manager.clone());
        let manager = BackupManager::new(config).await.unwrap();
        let result = manager.backup(workspace.nightly()).await;
        assert!(result.is_success(), "{:?}", result.error());
        database_manager.close().await;
        result.id()
    };

    let database_manager = Arc::new(DatabaseManager::new(&index).await.unwrap());
    let manager = BackupManager::new(workspace.manager_config().with_database_manager(database_manager))
        .await
        .unwrap();

    let record = manager.get_backup(id).unwrap();
    assert_eq!(record.name, "nightly");
    assert_eq!(record.backup_type, "filesystem");
    assert_eq!(record.compression.as_deref(), Some("zip"));
    assert_eq!(manager.get_last_backup().unwrap().id, id);
}
