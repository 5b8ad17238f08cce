pub mod backup_record;
pub mod schedule;
