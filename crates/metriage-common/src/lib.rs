pub mod format;
pub mod types;
