use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::backend::parse_base_url;
use crate::error::DashError;

/// suspect-watch-rs — operator dashboard for a remote suspect-matching service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "suspect-watch-rs",
    version,
    about = "Operator dashboard that drives scans against a remote suspect-matching service.",
    long_about = None
)]
pub struct Config {
    /// Base URL of the matching service.
    #[arg(long, env = "SUSPECT_WATCH_BACKEND", default_value = "http://localhost:8000")]
    pub backend_url: String,

    /// Address the dashboard listens on.
    #[arg(long, env = "SUSPECT_WATCH_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Auto-scan period in milliseconds.
    #[arg(long = "auto-scan-ms", env = "SUSPECT_WATCH_AUTO_SCAN_MS", default_value_t = 3000)]
    pub auto_scan_ms: u64,

    /// Roster polling period in milliseconds.
    #[arg(long = "roster-ms", env = "SUSPECT_WATCH_ROSTER_MS", default_value_t = 5000)]
    pub roster_ms: u64,

    /// Upper bound on any single backend request, in milliseconds.
    #[arg(long = "request-timeout-ms", env = "SUSPECT_WATCH_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Displayed clock refresh period in milliseconds.
    #[arg(long = "clock-ms", env = "SUSPECT_WATCH_CLOCK_MS", default_value_t = 1000)]
    pub clock_ms: u64,

    /// Directory with the static dashboard UI.
    #[arg(long = "ui-dir", env = "SUSPECT_WATCH_UI_DIR", default_value = "ui")]
    pub ui_dir: PathBuf,

    /// Do not poll the suspect roster in the background.
    #[arg(long = "no-roster", env = "SUSPECT_WATCH_NO_ROSTER", default_value_t = false)]
    pub no_roster: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), DashError> {
        parse_base_url(&self.backend_url)?;
        for (name, value) in [
            ("auto-scan-ms", self.auto_scan_ms),
            ("roster-ms", self.roster_ms),
            ("request-timeout-ms", self.request_timeout_ms),
            ("clock-ms", self.clock_ms),
        ] {
            if value == 0 {
                return Err(DashError::Validation(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    pub fn auto_scan_period(&self) -> Duration {
        Duration::from_millis(self.auto_scan_ms)
    }

    pub fn roster_period(&self) -> Duration {
        Duration::from_millis(self.roster_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn clock_period(&self) -> Duration {
        Duration::from_millis(self.clock_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            bind: "127.0.0.1:8080".to_string(),
            auto_scan_ms: 3000,
            roster_ms: 5000,
            request_timeout_ms: 10_000,
            clock_ms: 1000,
            ui_dir: PathBuf::from("ui"),
            no_roster: false,
        }
    }
}
