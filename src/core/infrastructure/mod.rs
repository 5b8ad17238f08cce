pub mod database_manager;
pub mod event_dispatcher;
pub mod process_runner;
