//! Diffing fetched snapshots and the polling loop that drives it.

pub mod diff;
pub mod scheduler;
