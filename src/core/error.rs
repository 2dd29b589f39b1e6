use std::io;

#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MonitorError {
    /// Whether the polling loop should simply try again on its next cycle.
    pub fn is_transient(&self) -> bool {
        !matches!(self, MonitorError::Config(_))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::Timeout
        } else if err.is_status() {
            MonitorError::Http(err.to_string())
        } else if err.is_decode() {
            MonitorError::Parse(err.to_string())
        } else if err.is_builder() {
            MonitorError::Config(err.to_string())
        } else {
            MonitorError::Fetch(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Parse(err.to_string())
    }
}
