pub mod adapter;
pub mod backup;
pub mod compression;
pub mod database;
pub mod io;
pub mod misc;
pub mod storage;
pub mod system;

use crate::model::error::adapter::AdapterError;
use crate::model::error::backup::BackupError;
use crate::model::error::compression::CompressionError;
use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use crate::model::error::misc::MiscError;
use crate::model::error::storage::StorageError;
use crate::model::error::system::SystemError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum Error {
    #[error(transparent)]
    Adapter(AdapterError),
    #[error(transparent)]
    Backup(BackupError),
    #[error(transparent)]
    Compression(CompressionError),
    #[error(transparent)]
    Database(DatabaseError),
    #[error(transparent)]
    IO(IOError),
    #[error(transparent)]
    Misc(MiscError),
    #[error(transparent)]
    Storage(StorageError),
    #[error(transparent)]
    System(SystemError),
}

impl Error {
    pub fn level(&self) -> tracing::Level {
        match self {
            Error::Adapter(error) => error.level(),
            Error::Backup(error) => error.level(),
            Error::Compression(error) => error.level(),
            Error::Database(error) => error.level(),
            Error::IO(error) => error.level(),
            Error::Misc(error) => error.level(),
            Error::Storage(error) => error.level(),
            Error::System(error) => error.level(),
        }
    }
}

impl From<AdapterError> for Error {
    fn from(error: AdapterError) -> Self {
        Self::Adapter(error)
    }
}

impl From<BackupError> for Error {
    fn from(error: BackupError) -> Self {
        Self::Backup(error)
    }
}

impl From<CompressionError> for Error {
    fn from(error: CompressionError) -> Self {
        Self::Compression(error)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Self {
        Self::Database(error)
    }
}

impl From<IOError> for Error {
    fn from(error: IOError) -> Self {
        Self::IO(error)
    }
}

impl From<MiscError> for Error {
    fn from(error: MiscError) -> Self {
        Self::Misc(error)
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<SystemError> for Error {
    fn from(error: SystemError) -> Self {
        Self::System(error)
    }
}
