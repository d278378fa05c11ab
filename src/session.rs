use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::activity_log::ActivityLog;
use crate::clock::Clock;
use crate::counters::ScanCounters;
use crate::types::{AlertResult, LogEntry, Severity};

/// All mutable dashboard state for one operator session.
///
/// Transitions are plain methods so they can be exercised without a runtime.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    log: ActivityLog,
    counters: ScanCounters,
    last_result: Option<AlertResult>,
    scanning: bool,
    auto_scan: bool,
    registration_status: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the in-flight latch. Returns `false` if a scan is already outstanding.
    pub fn try_begin_scan(&mut self) -> bool {
        if self.scanning {
            return false;
        }
        self.scanning = true;
        true
    }

    /// Release the latch and apply one scan outcome to result, log and counters.
    pub fn complete_scan(&mut self, result: AlertResult, timestamp: String) -> LogEntry {
        self.scanning = false;
        self.counters.record(&result);
        let entry = LogEntry::new(timestamp, result.log_message(), result.severity());
        self.log.append(entry.clone());
        self.last_result = Some(result);
        entry
    }

    pub fn record(&mut self, entry: LogEntry) {
        self.log.append(entry);
    }

    pub fn set_auto_scan(&mut self, enabled: bool) {
        self.auto_scan = enabled;
    }

    pub fn set_registration_status(&mut self, status: impl Into<String>) {
        self.registration_status = Some(status.into());
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn auto_scan(&self) -> bool {
        self.auto_scan
    }

    pub fn counters(&self) -> ScanCounters {
        self.counters
    }

    pub fn last_result(&self) -> Option<&AlertResult> {
        self.last_result.as_ref()
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn registration_status(&self) -> Option<&str> {
        self.registration_status.as_deref()
    }
}

/// Serializable view of [`SessionState`] for the dashboard API.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub scanning: bool,
    pub auto_scan: bool,
    pub status: String,
    pub threat_level: String,
    pub last_result: Option<AlertResult>,
    pub counters: ScanCounters,
    pub registration_status: Option<String>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(s: &SessionState) -> Self {
        let (status, threat_level) = match &s.last_result {
            Some(r) => (r.status_label().to_string(), r.threat_level()),
            None => ("Awaiting Scan".to_string(), "LOW"),
        };
        Self {
            scanning: s.scanning,
            auto_scan: s.auto_scan,
            status,
            threat_level: threat_level.to_string(),
            last_result: s.last_result.clone(),
            counters: s.counters,
            registration_status: s.registration_status.clone(),
        }
    }
}

/// Shared handle to the session state plus the clock that stamps its log entries.
#[derive(Clone)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::new())),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Append one entry stamped with the current clock label.
    pub async fn log(&self, message: impl Into<String>, severity: Severity) {
        let entry = LogEntry::new(self.clock.now_label(), message, severity);
        self.inner.write().await.record(entry);
    }

    pub async fn try_begin_scan(&self) -> bool {
        self.inner.write().await.try_begin_scan()
    }

    pub async fn complete_scan(&self, result: AlertResult) -> LogEntry {
        let timestamp = self.clock.now_label();
        self.inner.write().await.complete_scan(result, timestamp)
    }

    pub async fn set_auto_scan(&self, enabled: bool) {
        self.inner.write().await.set_auto_scan(enabled);
    }

    pub async fn set_registration_status(&self, status: impl Into<String>) {
        self.inner.write().await.set_registration_status(status);
    }

    pub async fn is_scanning(&self) -> bool {
        self.inner.read().await.is_scanning()
    }

    pub async fn counters(&self) -> ScanCounters {
        self.inner.read().await.counters()
    }

    /// Log entries newest-first.
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.inner.read().await.log().to_vec()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.inner.read().await)
    }
}
