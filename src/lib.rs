//! Adaptive status page monitoring with exactly-once change notifications.

pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod sources;

pub use crate::core::error::MonitorError;
pub use crate::core::types::{ChangeEvent, ChangeKind, Component, IncidentSnapshot, Notification};
pub use crate::pipeline::scheduler::{Monitor, PollConfig};
pub use crate::sources::DataSource;
