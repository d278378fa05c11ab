use serde::{Deserialize, Serialize};

use crate::types::AlertResult;

/// Session scan totals. Only ever grow; a new session starts from zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounters {
    pub total: u64,
    pub alerts: u64,
}

impl ScanCounters {
    /// Count one completed scan attempt. Offline attempts count towards
    /// `total` but never towards `alerts`.
    pub fn record(&mut self, result: &AlertResult) {
        self.total += 1;
        if result.is_alert() {
            self.alerts += 1;
        }
    }
}
