pub mod backup_configuration;
pub mod backup_result;
pub mod backup_schedule;
pub mod backup_type;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod hash_type;
pub mod log;
pub mod process;
pub mod retention;
