pub mod schedule_manager;
pub mod schedule_timer;
