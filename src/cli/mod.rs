pub mod config;
pub mod flags;
