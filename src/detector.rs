use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time;

use crate::backend::Backend;
use crate::error::DashError;
use crate::types::{AlertResult, DetectionResponse, ImageUpload, RED_ALERT, SAFE};

/// Map one successful detection payload onto the alert taxonomy.
///
/// `RED ALERT` and `SAFE` are the only recognised sentinels; anything else
/// (including `WAITING`, `NO_FACE` or an error body) is `Unknown` and carries
/// the backend's message verbatim.
pub fn classify(resp: &DetectionResponse) -> AlertResult {
    match resp.alert.as_deref() {
        Some(RED_ALERT) => AlertResult::RedAlert {
            message: resp.message.clone().unwrap_or_default(),
        },
        Some(SAFE) => AlertResult::Safe,
        other => AlertResult::Unknown {
            message: resp
                .message
                .clone()
                .or_else(|| other.map(str::to_string))
                .unwrap_or_default(),
        },
    }
}

/// Single-shot verdict for an uploaded image.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Verdict {
    pub result: AlertResult,
    pub confidence: Option<f64>,
}

/// Issues detection requests and folds every failure into [`AlertResult::Offline`].
///
/// Each request is bounded by `timeout`, so a hung backend cannot hold the
/// caller forever. There is no retry.
pub struct DetectionClient<B> {
    backend: Arc<B>,
    timeout: Duration,
}

impl<B> Clone for DetectionClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            timeout: self.timeout,
        }
    }
}

impl<B: Backend> DetectionClient<B> {
    pub fn new(backend: Arc<B>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the backend for the current live-camera verdict.
    pub async fn detect(&self) -> AlertResult {
        match self.bounded(self.backend.check()).await {
            Ok(resp) => classify(&resp),
            Err(e) => {
                tracing::warn!(error = %e, "detection request failed");
                AlertResult::Offline
            }
        }
    }

    /// Ask the backend to match one uploaded image.
    pub async fn detect_image(&self, image: ImageUpload) -> Verdict {
        match self.bounded(self.backend.detect(image)).await {
            Ok(resp) => Verdict {
                result: classify(&resp),
                confidence: resp.confidence,
            },
            Err(e) => {
                tracing::warn!(error = %e, "image detection request failed");
                Verdict {
                    result: AlertResult::Offline,
                    confidence: None,
                }
            }
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, DashError>>,
    ) -> Result<T, DashError> {
        match time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(DashError::Timeout(self.timeout)),
        }
    }
}
