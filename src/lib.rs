//! Library crate for suspect-watch-rs: scan orchestration and alert state for
//! an operator dashboard in front of a remote suspect-matching service.
pub mod activity_log;
pub mod backend;
pub mod clock;
pub mod config;
pub mod controller;
pub mod counters;
pub mod detector;
pub mod error;
pub mod registration;
pub mod roster;
pub mod schedule;
pub mod server;
pub mod session;
pub mod types;
