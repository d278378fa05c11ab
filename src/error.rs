use std::time::Duration;

use thiserror::Error;

/// Failures raised at the edges of the dashboard.
///
/// None of these escape to crash a session: the scan path folds transport
/// failures into [`crate::types::AlertResult::Offline`], and the registration
/// path turns them into a status message or a log entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DashError {
    /// Required input missing; rejected before any network call.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Connection error, non-2xx status or undecodable body.
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend did not answer within the configured timeout.
    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),
    /// Well-formed error payload from the backend.
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

impl DashError {
    /// `true` for failures of the transport itself (including timeouts).
    pub fn is_transport(&self) -> bool {
        matches!(self, DashError::Transport(_) | DashError::Timeout(_))
    }
}

impl From<reqwest::Error> for DashError {
    fn from(e: reqwest::Error) -> Self {
        DashError::Transport(e.to_string())
    }
}
