use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// When the first tick of a [`Repeating`] task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediate,
    AfterPeriod,
}

/// Handle to a repeating background task.
///
/// Cancelling only stops future ticks: a tick body that is already running
/// is allowed to finish. Dropping the handle cancels it.
#[derive(Debug)]
pub struct Repeating {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Repeating {
    /// Run `tick` every `period` on the current tokio runtime until cancelled.
    /// Ticks missed while a body runs are skipped, never queued.
    pub fn spawn<F, Fut>(period: Duration, first: FirstTick, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let start = match first {
            FirstTick::Immediate => Instant::now(),
            FirstTick::AfterPeriod => Instant::now() + period,
        };
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                // Re-check: cancellation may land while the tick was pending.
                if token.is_cancelled() {
                    break;
                }
                tick().await;
            }
        });
        Self { cancel, task }
    }

    /// Stop future ticks. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Repeating {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn immediate_first_tick_runs_right_away() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let task = Repeating::spawn(Duration::from_secs(60), FirstTick::Immediate, move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        task.cancel();
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_stops_ticks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let task = Repeating::spawn(Duration::from_millis(10), FirstTick::AfterPeriod, move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });
        time::sleep(Duration::from_millis(45)).await;
        task.cancel();
        task.cancel();
        assert!(task.is_cancelled());
        time::sleep(Duration::from_millis(20)).await;
        let after_cancel = hits.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), after_cancel);
        assert!(task.is_finished());
    }
}
