use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::detector::DetectionClient;
use crate::schedule::{FirstTick, Repeating};
use crate::session::Session;
use crate::types::AlertResult;

/// What happened to one scan request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The request went out and its classified result has been applied.
    Completed(AlertResult),
    /// Another scan was in flight; nothing was sent.
    Skipped,
}

/// Decides when a detection request fires and applies every outcome to the session.
///
/// Manual triggers and auto-scan ticks share one in-flight latch, so at most
/// one detection request is outstanding at any time. A request arriving while
/// the latch is held is dropped, not queued.
pub struct ScanController<B> {
    inner: Arc<ControllerInner<B>>,
}

struct ControllerInner<B> {
    session: Session,
    client: DetectionClient<B>,
    auto_period: Duration,
    auto_task: Mutex<Option<Repeating>>,
}

impl<B> Clone for ScanController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend> ScanController<B> {
    pub fn new(session: Session, client: DetectionClient<B>, auto_period: Duration) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                session,
                client,
                auto_period,
                auto_task: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn auto_period(&self) -> Duration {
        self.inner.auto_period
    }

    /// Operator-initiated scan. Refused while another scan is in flight.
    pub async fn trigger_manual_scan(&self) -> ScanOutcome {
        self.run_scan("manual").await
    }

    /// Whether a detection request is currently outstanding.
    pub async fn is_scanning(&self) -> bool {
        self.inner.session.is_scanning().await
    }

    pub async fn auto_scan_enabled(&self) -> bool {
        self.inner.auto_task.lock().await.is_some()
    }

    /// Arm or disarm the auto-scan timer.
    ///
    /// Disarming stops future ticks only; a request already in flight still
    /// completes and is applied normally. Setting the current mode again is a
    /// no-op.
    pub async fn set_auto_scan(&self, enabled: bool) {
        let mut task = self.inner.auto_task.lock().await;
        match (enabled, task.is_some()) {
            (true, false) => {
                let weak = Arc::downgrade(&self.inner);
                *task = Some(Repeating::spawn(
                    self.inner.auto_period,
                    FirstTick::AfterPeriod,
                    move || {
                        spawn_auto_scan(&weak);
                        std::future::ready(())
                    },
                ));
                tracing::info!(
                    period_ms = self.inner.auto_period.as_millis() as u64,
                    "auto-scan enabled"
                );
            }
            (false, true) => {
                if let Some(t) = task.take() {
                    t.cancel();
                }
                tracing::info!("auto-scan disabled");
            }
            _ => {}
        }
        self.inner.session.set_auto_scan(enabled).await;
    }

    async fn run_scan(&self, trigger: &'static str) -> ScanOutcome {
        if !self.inner.session.try_begin_scan().await {
            tracing::debug!(trigger, "scan skipped: another scan is in flight");
            return ScanOutcome::Skipped;
        }
        tracing::debug!(trigger, "scan started");

        // The request and its write-back run in their own task: if the caller
        // goes away mid-scan the outcome is still applied and the latch released.
        let this = self.clone();
        let task = tokio::spawn(async move {
            let result = this.inner.client.detect().await;
            let entry = this.inner.session.complete_scan(result.clone()).await;
            tracing::info!(
                trigger,
                status = result.status_label(),
                message = %entry.message,
                "scan completed"
            );
            result
        });

        match task.await {
            Ok(result) => ScanOutcome::Completed(result),
            Err(e) => {
                tracing::error!(trigger, error = %e, "scan task failed");
                self.inner.session.complete_scan(AlertResult::Offline).await;
                ScanOutcome::Completed(AlertResult::Offline)
            }
        }
    }
}

/// Runs one auto-scan tick detached from the timer, so the timer keeps its
/// cadence and an overlapping tick hits the latch instead of waiting.
fn spawn_auto_scan<B: Backend>(weak: &Weak<ControllerInner<B>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let this = ScanController { inner };
    tokio::spawn(async move {
        this.run_scan("auto").await;
    });
}
