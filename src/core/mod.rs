pub mod adapter;
pub mod app_config;
pub mod backup_manager;
pub mod compression;
pub mod driver_resolver;
pub mod infrastructure;
pub mod manager_config;
pub mod schedule;
pub mod storage;
pub mod system;
