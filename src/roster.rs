use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::backend::Backend;
use crate::schedule::{FirstTick, Repeating};

/// Keeps a local copy of the registered-suspect roster in step with the backend.
///
/// Every successful fetch replaces the roster wholesale. A failed fetch leaves
/// the previous snapshot untouched and is only traced, never put in the
/// activity log: background refresh failures are routine network noise.
pub struct RosterSync<B> {
    inner: Arc<RosterInner<B>>,
}

struct RosterInner<B> {
    backend: Arc<B>,
    timeout: Duration,
    roster: RwLock<RosterState>,
    next_seq: AtomicU64,
    poller: Mutex<Option<Repeating>>,
}

#[derive(Debug, Default)]
struct RosterState {
    names: Vec<String>,
    // Sequence number of the fetch that produced `names`.
    applied_seq: u64,
}

impl<B> Clone for RosterSync<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend> RosterSync<B> {
    pub fn new(backend: Arc<B>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RosterInner {
                backend,
                timeout,
                roster: RwLock::new(RosterState::default()),
                next_seq: AtomicU64::new(1),
                poller: Mutex::new(None),
            }),
        }
    }

    /// Begin polling every `interval`, fetching once right away.
    /// Restarting replaces the previous poller.
    pub async fn start(&self, interval: Duration) {
        let weak: Weak<RosterInner<B>> = Arc::downgrade(&self.inner);
        let task = Repeating::spawn(interval, FirstTick::Immediate, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh().await;
                }
            }
        });
        if let Some(old) = self.inner.poller.lock().await.replace(task) {
            old.cancel();
        }
        tracing::debug!(interval_ms = interval.as_millis() as u64, "roster polling started");
    }

    /// Stop polling. A fetch already under way still lands.
    pub async fn stop(&self) {
        if let Some(task) = self.inner.poller.lock().await.take() {
            task.cancel();
            tracing::debug!("roster polling stopped");
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.poller.lock().await.is_some()
    }

    /// Fetch now instead of waiting for the next tick; returns the roster afterwards.
    pub async fn force_refresh(&self) -> Vec<String> {
        self.inner.refresh().await;
        self.snapshot().await
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.inner.roster.read().await.names.clone()
    }
}

impl<B: Backend> RosterInner<B> {
    async fn refresh(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let fetched = match tokio::time::timeout(self.timeout, self.backend.list_suspects()).await {
            Ok(Ok(names)) => names,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "roster refresh failed; keeping previous roster");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "roster refresh timed out; keeping previous roster"
                );
                return;
            }
        };

        let mut roster = self.roster.write().await;
        // A slower, older fetch must not overwrite a newer snapshot.
        if seq < roster.applied_seq {
            tracing::debug!(seq, applied = roster.applied_seq, "discarding stale roster fetch");
            return;
        }
        roster.applied_seq = seq;
        roster.names = fetched;
    }
}
