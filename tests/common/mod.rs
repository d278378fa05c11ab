//! Scripted in-memory backend shared by the integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use suspect_watch_rs::backend::Backend;
use suspect_watch_rs::clock::FixedClock;
use suspect_watch_rs::error::DashError;
use suspect_watch_rs::session::Session;
use suspect_watch_rs::types::{DetectionResponse, ImageUpload};

pub const CLOCK_LABEL: &str = "12:00:00";

#[derive(Default)]
pub struct FakeBackend {
    pub check_calls: AtomicUsize,
    pub detect_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
    check_delay: Mutex<Duration>,
    check_response: Mutex<Option<Result<DetectionResponse, DashError>>>,
    suspects: Mutex<Vec<String>>,
    list_error: Mutex<Option<DashError>>,
    // Consumed one per list call, in call order.
    list_delays: Mutex<VecDeque<Duration>>,
    upload_error: Mutex<Option<DashError>>,
    remove_error: Mutex<Option<DashError>>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_suspects(names: &[&str]) -> Arc<Self> {
        let b = Self::default();
        b.set_suspects(names);
        Arc::new(b)
    }

    pub fn respond(&self, alert: &str, message: Option<&str>) {
        *self.check_response.lock().unwrap() = Some(Ok(DetectionResponse {
            alert: Some(alert.to_string()),
            message: message.map(str::to_string),
            ..Default::default()
        }));
    }

    pub fn fail_check(&self, err: DashError) {
        *self.check_response.lock().unwrap() = Some(Err(err));
    }

    pub fn set_check_delay(&self, delay: Duration) {
        *self.check_delay.lock().unwrap() = delay;
    }

    pub fn set_suspects(&self, names: &[&str]) {
        *self.suspects.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn fail_list(&self, err: Option<DashError>) {
        *self.list_error.lock().unwrap() = err;
    }

    /// Queue a delay for a later list call, one per call in call order. The
    /// roster a delayed call returns is captured when the call starts.
    pub fn push_list_delay(&self, delay: Duration) {
        self.list_delays.lock().unwrap().push_back(delay);
    }

    pub fn fail_upload(&self, err: DashError) {
        *self.upload_error.lock().unwrap() = Some(err);
    }

    pub fn fail_remove(&self, err: DashError) {
        *self.remove_error.lock().unwrap() = Some(err);
    }

    pub fn calls(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn network_calls(&self) -> usize {
        [
            &self.check_calls,
            &self.detect_calls,
            &self.list_calls,
            &self.upload_calls,
            &self.remove_calls,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

impl Backend for FakeBackend {
    async fn check(&self) -> Result<DetectionResponse, DashError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.check_delay.lock().unwrap();
        let response = self
            .check_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(DetectionResponse::default()));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn detect(&self, _image: ImageUpload) -> Result<DetectionResponse, DashError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DetectionResponse {
            alert: Some("RED ALERT".into()),
            message: Some("SUSPECT: bob".into()),
            confidence: Some(0.82),
            status: None,
        })
    }

    async fn list_suspects(&self) -> Result<Vec<String>, DashError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.list_delays.lock().unwrap().pop_front();
        let err = self.list_error.lock().unwrap().clone();
        let names = self.suspects.lock().unwrap().clone();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match err {
            Some(e) => Err(e),
            None => Ok(names),
        }
    }

    async fn upload_suspect(&self, name: &str, _image: ImageUpload) -> Result<(), DashError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let err = self.upload_error.lock().unwrap().clone();
        match err {
            Some(e) => Err(e),
            None => {
                self.suspects.lock().unwrap().push(name.to_string());
                Ok(())
            }
        }
    }

    async fn remove_suspect(&self, name: &str) -> Result<(), DashError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let err = self.remove_error.lock().unwrap().clone();
        match err {
            Some(e) => Err(e),
            None => {
                self.suspects.lock().unwrap().retain(|n| n != name);
                Ok(())
            }
        }
    }
}

#[allow(dead_code)]
pub fn session() -> Session {
    Session::new(Arc::new(FixedClock::new(CLOCK_LABEL)))
}

#[allow(dead_code)]
pub fn image() -> Option<ImageUpload> {
    Some(ImageUpload::new("face.jpg", vec![0xFF, 0xD8, 0xFF]).with_content_type("image/jpeg"))
}
