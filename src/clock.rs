use std::sync::Arc;
use std::time::Duration;

use ::time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};
use tokio::sync::watch;

use crate::schedule::{FirstTick, Repeating};

const TIME_LABEL: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Source of the wall-clock labels shown on the dashboard and stamped on log entries.
pub trait Clock: Send + Sync + 'static {
    fn now_label(&self) -> String;
}

/// Local wall clock, or UTC when the local offset cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_label(&self) -> String {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        now.format(TIME_LABEL)
            .unwrap_or_else(|_| String::from("00:00:00"))
    }
}

/// Clock that always reports the same label.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl Clock for FixedClock {
    fn now_label(&self) -> String {
        self.0.clone()
    }
}

/// Publishes the displayed time once per period.
pub struct ClockTicker {
    rx: watch::Receiver<String>,
    _task: Repeating,
}

impl ClockTicker {
    pub fn spawn(clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (tx, rx) = watch::channel(clock.now_label());
        let task = Repeating::spawn(period, FirstTick::Immediate, move || {
            let _ = tx.send(clock.now_label());
            std::future::ready(())
        });
        Self { rx, _task: task }
    }

    pub fn current(&self) -> String {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}
