pub mod handler;
pub mod patch;
