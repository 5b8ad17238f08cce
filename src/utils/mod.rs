pub mod artifact;
pub mod database_lock;
pub mod file_hash;
pub mod glob;
pub mod logging;
