use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on `<index>.lock`, released on drop.
#[derive(Debug)]
pub struct DatabaseLock {
    file: File,
    path: PathBuf,
}

impl DatabaseLock {
    pub fn acquire(index_path: &Path) -> Result<Self, Error> {
        let path = Self::lock_path(index_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|err| IOError::create_file_failed(path.clone(), err))?;
        let acquired =
            FileExt::try_lock_exclusive(&file).map_err(DatabaseError::lock_database_failed)?;
        if !acquired {
            Err(DatabaseError::lock_database_failed(format!(
                "{} is held by another process",
                path.display()
            )))?
        }
        Ok(Self { file, path })
    }

    pub fn lock_path(index_path: &Path) -> PathBuf {
        let mut name = index_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            IOError::lock_file_failed(self.path.clone(), err).log();
        }
    }
}
