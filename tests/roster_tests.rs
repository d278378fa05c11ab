mod common;

use std::time::Duration;

use common::FakeBackend;
use suspect_watch_rs::error::DashError;
use suspect_watch_rs::registration::{Confirmation, Registration, RemovalOutcome};
use suspect_watch_rs::roster::RosterSync;
use suspect_watch_rs::session::Session;
use suspect_watch_rs::types::Severity;
use tokio::time::sleep;

const TIMEOUT: Duration = Duration::from_secs(5);

fn registration(backend: &std::sync::Arc<FakeBackend>) -> (Registration<FakeBackend>, Session) {
    let session = common::session();
    let roster = RosterSync::new(backend.clone(), TIMEOUT);
    (
        Registration::new(backend.clone(), session.clone(), roster, TIMEOUT),
        session,
    )
}

#[tokio::test]
async fn unregister_then_refresh_drops_the_name() {
    let backend = FakeBackend::with_suspects(&["A", "B"]);
    let (reg, session) = registration(&backend);
    assert_eq!(reg.roster().force_refresh().await, vec!["A", "B"]);

    let outcome = reg.unregister("A", Confirmation::Confirmed).await;
    assert_eq!(outcome, RemovalOutcome::Removed);
    assert_eq!(reg.roster().force_refresh().await, vec!["B"]);

    let entries = session.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Secondary);
    assert!(entries[0].message.contains('A'));
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let backend = FakeBackend::with_suspects(&["A"]);
    let (reg, session) = registration(&backend);

    assert_eq!(reg.unregister("A", false.into()).await, RemovalOutcome::Cancelled);
    assert_eq!(backend.network_calls(), 0);
    assert!(session.entries().await.is_empty());
}

#[tokio::test]
async fn failed_removal_logs_red() {
    let backend = FakeBackend::with_suspects(&["A"]);
    backend.fail_remove(DashError::Transport("503 Service Unavailable".into()));
    let (reg, session) = registration(&backend);

    assert_eq!(reg.unregister("A", Confirmation::Confirmed).await, RemovalOutcome::Failed);
    let entries = session.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Red);
    assert_eq!(entries[0].message, "Error deleting A");
}

#[tokio::test]
async fn failed_fetch_keeps_previous_roster_silently() {
    let backend = FakeBackend::with_suspects(&["A", "B"]);
    let (reg, session) = registration(&backend);
    reg.roster().force_refresh().await;

    backend.fail_list(Some(DashError::Transport("connection reset".into())));
    assert_eq!(reg.roster().force_refresh().await, vec!["A", "B"]);
    assert!(session.entries().await.is_empty());

    backend.fail_list(None);
    backend.set_suspects(&[]);
    assert!(reg.roster().force_refresh().await.is_empty());
}

#[tokio::test]
async fn slow_older_fetch_does_not_overwrite_newer_roster() {
    let backend = FakeBackend::with_suspects(&["old"]);
    backend.push_list_delay(Duration::from_millis(150));
    backend.push_list_delay(Duration::ZERO);
    let roster = RosterSync::new(backend.clone(), TIMEOUT);

    let slow = {
        let roster = roster.clone();
        tokio::spawn(async move { roster.force_refresh().await })
    };
    sleep(Duration::from_millis(20)).await;

    backend.set_suspects(&["new"]);
    assert_eq!(roster.force_refresh().await, vec!["new"]);

    // The first fetch answers last with the roster it saw when it started.
    assert_eq!(slow.await.unwrap(), vec!["new"]);
    assert_eq!(roster.snapshot().await, vec!["new"]);
    assert_eq!(backend.calls(&backend.list_calls), 2);
}

#[tokio::test]
async fn polling_tracks_backend_until_stopped() {
    let backend = FakeBackend::with_suspects(&["A"]);
    let roster = RosterSync::new(backend.clone(), TIMEOUT);

    roster.start(Duration::from_millis(20)).await;
    assert!(roster.is_polling().await);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(roster.snapshot().await, vec!["A"]);

    backend.set_suspects(&["A", "C"]);
    sleep(Duration::from_millis(60)).await;
    assert_eq!(roster.snapshot().await, vec!["A", "C"]);

    roster.stop().await;
    roster.stop().await;
    assert!(!roster.is_polling().await);
    sleep(Duration::from_millis(10)).await;
    let calls = backend.calls(&backend.list_calls);
    sleep(Duration::from_millis(60)).await;
    assert_eq!(backend.calls(&backend.list_calls), calls);
}

#[tokio::test]
async fn register_with_empty_name_makes_no_network_call() {
    let backend = FakeBackend::new();
    let (reg, session) = registration(&backend);

    let err = reg.register("", common::image()).await.unwrap_err();
    assert!(matches!(err, DashError::Validation(_)));
    let err = reg.register("   ", common::image()).await.unwrap_err();
    assert!(matches!(err, DashError::Validation(_)));
    let err = reg.register("Zed", None).await.unwrap_err();
    assert!(matches!(err, DashError::Validation(_)));

    assert_eq!(backend.network_calls(), 0);
    assert!(session.entries().await.is_empty());
    assert_eq!(
        session.snapshot().await.registration_status.as_deref(),
        Some("Please provide both name and photo.")
    );
}

#[tokio::test]
async fn successful_registration_logs_green_and_refreshes_roster() {
    let backend = FakeBackend::with_suspects(&["A"]);
    let (reg, session) = registration(&backend);

    let status = reg.register("Zed", common::image()).await.unwrap();
    assert_eq!(status, "Success! Suspect added.");
    assert_eq!(reg.roster().snapshot().await, vec!["A", "Zed"]);

    let entries = session.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Green);
    assert_eq!(entries[0].message, "New suspect added: Zed");
}

#[tokio::test]
async fn rejected_registration_sets_status_but_does_not_log() {
    let backend = FakeBackend::new();
    backend.fail_upload(DashError::Rejected("No face detected in the uploaded image.".into()));
    let (reg, session) = registration(&backend);

    let err = reg.register("Zed", common::image()).await.unwrap_err();
    assert!(matches!(err, DashError::Rejected(_)));
    assert!(session.entries().await.is_empty());
    assert_eq!(
        session.snapshot().await.registration_status.as_deref(),
        Some("Error: No face detected in the uploaded image.")
    );
    assert_eq!(backend.calls(&backend.list_calls), 0);
}

#[tokio::test]
async fn transport_failure_during_registration_reports_system_error() {
    let backend = FakeBackend::new();
    backend.fail_upload(DashError::Transport("connection refused".into()));
    let (reg, session) = registration(&backend);

    assert!(reg.register("Zed", common::image()).await.is_err());
    assert_eq!(
        session.snapshot().await.registration_status.as_deref(),
        Some("Upload failed. System error.")
    );
    assert!(session.entries().await.is_empty());
}
