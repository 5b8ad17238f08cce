pub mod backup_adapter;
pub mod compression_adapter;
pub mod event_sink;
pub mod process_runner;
pub mod repository;
pub mod storage_adapter;

pub trait ThreadSafe: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> ThreadSafe for T {}
