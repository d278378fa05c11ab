use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::backend::Backend;
use crate::error::DashError;
use crate::roster::RosterSync;
use crate::session::Session;
use crate::types::{ImageUpload, Severity};

pub const MISSING_INPUT_STATUS: &str = "Please provide both name and photo.";
pub const SUCCESS_STATUS: &str = "Success! Suspect added.";
pub const SYSTEM_ERROR_STATUS: &str = "Upload failed. System error.";

/// Status line shown to the operator after a failed registration.
pub fn failure_status(err: &DashError) -> String {
    match err {
        DashError::Rejected(msg) => format!("Error: {msg}"),
        DashError::Validation(_) => MISSING_INPUT_STATUS.to_string(),
        _ => SYSTEM_ERROR_STATUS.to_string(),
    }
}

/// Operator answer to the "remove this suspect?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOutcome {
    Removed,
    Failed,
    /// The operator declined; no request was sent.
    Cancelled,
}

/// Adds and removes suspects, then pulls the roster forward.
pub struct Registration<B> {
    backend: Arc<B>,
    session: Session,
    roster: RosterSync<B>,
    timeout: Duration,
}

impl<B> Clone for Registration<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            session: self.session.clone(),
            roster: self.roster.clone(),
            timeout: self.timeout,
        }
    }
}

impl<B: Backend> Registration<B> {
    pub fn new(backend: Arc<B>, session: Session, roster: RosterSync<B>, timeout: Duration) -> Self {
        Self {
            backend,
            session,
            roster,
            timeout,
        }
    }

    /// Register `name` with the given photo.
    ///
    /// Input is checked before anything goes on the wire. The outcome is
    /// reported through the transient registration status; only a successful
    /// registration reaches the activity log.
    pub async fn register(&self, name: &str, image: Option<ImageUpload>) -> Result<String, DashError> {
        let name = name.trim();
        let image = match image {
            Some(img) if !name.is_empty() && !img.is_empty() => img,
            _ => {
                self.session.set_registration_status(MISSING_INPUT_STATUS).await;
                return Err(DashError::Validation(MISSING_INPUT_STATUS.to_string()));
            }
        };

        let res = match tokio::time::timeout(self.timeout, self.backend.upload_suspect(name, image)).await {
            Ok(res) => res,
            Err(_) => Err(DashError::Timeout(self.timeout)),
        };

        match res {
            Ok(()) => {
                tracing::info!(suspect = name, "suspect registered");
                self.session.set_registration_status(SUCCESS_STATUS).await;
                self.session
                    .log(format!("New suspect added: {name}"), Severity::Green)
                    .await;
                self.roster.force_refresh().await;
                Ok(SUCCESS_STATUS.to_string())
            }
            Err(e) => {
                tracing::warn!(suspect = name, error = %e, "suspect registration failed");
                self.session.set_registration_status(failure_status(&e)).await;
                Err(e)
            }
        }
    }

    /// Remove `name` from the backend. Irreversible, hence the confirmation gate.
    pub async fn unregister(&self, name: &str, confirmation: Confirmation) -> RemovalOutcome {
        if confirmation == Confirmation::Declined {
            return RemovalOutcome::Cancelled;
        }

        let res = match tokio::time::timeout(self.timeout, self.backend.remove_suspect(name)).await {
            Ok(res) => res,
            Err(_) => Err(DashError::Timeout(self.timeout)),
        };

        match res {
            Ok(()) => {
                tracing::info!(suspect = name, "suspect removed");
                self.session
                    .log(format!("Suspect removed: {name}"), Severity::Secondary)
                    .await;
                self.roster.force_refresh().await;
                RemovalOutcome::Removed
            }
            Err(e) => {
                tracing::warn!(suspect = name, error = %e, "suspect removal failed");
                self.session
                    .log(format!("Error deleting {name}"), Severity::Red)
                    .await;
                RemovalOutcome::Failed
            }
        }
    }

    pub fn roster(&self) -> &RosterSync<B> {
        &self.roster
    }
}
