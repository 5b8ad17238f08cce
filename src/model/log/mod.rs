pub mod backup;
pub mod database;
pub mod event;
pub mod schedule;
pub mod system;
