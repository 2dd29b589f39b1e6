//! Where monitors get their data from.

use async_trait::async_trait;

use crate::core::error::MonitorError;
use crate::core::types::{Component, IncidentSnapshot};

pub mod statuspage;

/// The three reads a monitor performs against a status provider.
///
/// Implementations bound their own latency; the scheduler waits for every call to return.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Raw bytes of the cheap summary endpoint, used only for fingerprinting.
    async fn fetch_summary(&self) -> Result<Vec<u8>, MonitorError>;

    async fn fetch_incidents(&self) -> Result<Vec<IncidentSnapshot>, MonitorError>;

    async fn fetch_components(&self) -> Result<Vec<Component>, MonitorError>;
}
