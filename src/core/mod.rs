//! Change detection state, shared types, and the multi-feed engine.

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod shutdown;
pub mod store;
pub mod time;
pub mod types;
