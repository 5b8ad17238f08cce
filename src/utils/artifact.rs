use crate::model::log::backup::BackupLog;
use chrono::{DateTime, Utc};
use macros::log;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn default_name(now: DateTime<Utc>) -> String {
    format!("backup_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Keeps ASCII alphanumerics, `-` and `_`; anything else becomes `_`.
pub fn slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "backup".to_string()
    } else {
        slug.to_string()
    }
}

/// Extension-less artifact name, unique per attempt.
pub fn artifact_stem(name: &str, created_at: DateTime<Utc>, id: Uuid) -> String {
    let id = id.simple().to_string();
    format!(
        "{}_{}_{}",
        slug(name),
        created_at.format("%Y%m%d_%H%M%S_%3f"),
        &id[..8]
    )
}

/// Local paths created by one pipeline, removed together unless released.
#[derive(Debug, Default)]
pub struct ArtifactCleanup {
    paths: Vec<PathBuf>,
}

impl ArtifactCleanup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn release(&mut self, path: &Path) {
        self.paths.retain(|tracked| tracked != path);
    }

    pub async fn remove_all(self) {
        for path in self.paths {
            remove_path(&path).await;
        }
    }
}

/// Removes a file or directory tree, absent paths are fine.
pub async fn remove_path(path: &Path) {
    let removed = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    };
    match removed {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => log!(
            BackupLog::CleanupFailed {
                path: path.display().to_string()
            },
            err
        ),
    }
}
