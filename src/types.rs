use serde::{Deserialize, Serialize};

/// Alert value the backend uses for a confirmed suspect match.
pub const RED_ALERT: &str = "RED ALERT";
/// Alert value the backend uses when only authorised visitors are seen.
pub const SAFE: &str = "SAFE";

pub const OFFLINE_MESSAGE: &str = "Scanner System: Off-line";
pub const SAFE_MESSAGE: &str = "Security Check: AUTHORISED";

/// Classified outcome of one completed scan attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertResult {
    RedAlert { message: String },
    Safe,
    Unknown { message: String },
    Offline,
}

impl AlertResult {
    pub fn is_alert(&self) -> bool {
        matches!(self, AlertResult::RedAlert { .. })
    }

    /// Severity of the log entry this result produces.
    pub fn severity(&self) -> Severity {
        match self {
            AlertResult::RedAlert { .. } | AlertResult::Offline => Severity::Red,
            AlertResult::Safe => Severity::Green,
            AlertResult::Unknown { .. } => Severity::Secondary,
        }
    }

    /// Text appended to the activity log for this result.
    pub fn log_message(&self) -> String {
        match self {
            AlertResult::RedAlert { message } => format!("ALERT: {message}"),
            AlertResult::Safe => SAFE_MESSAGE.to_string(),
            AlertResult::Unknown { message } => message.clone(),
            AlertResult::Offline => OFFLINE_MESSAGE.to_string(),
        }
    }

    /// Short status shown on the dashboard status card.
    pub fn status_label(&self) -> &str {
        match self {
            AlertResult::RedAlert { .. } => RED_ALERT,
            AlertResult::Safe => SAFE,
            AlertResult::Unknown { .. } => "UNKNOWN",
            AlertResult::Offline => "OFFLINE",
        }
    }

    pub fn threat_level(&self) -> &'static str {
        if self.is_alert() {
            "CRITICAL"
        } else {
            "LOW"
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Red,
    Green,
    Secondary,
}

/// One immutable activity log line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(timestamp: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Body returned by `GET /check` and `POST /detect`.
///
/// Every field is optional: the backend answers errors on `/detect` with
/// `{status, message}` and no `alert` at all.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DetectionResponse {
    #[serde(default)]
    pub alert: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body returned by `POST /upload` and `DELETE /suspects/<name>`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Body returned by `GET /suspects`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspectList {
    #[serde(default)]
    pub suspects: Vec<String>,
}

/// Image file handed to the backend as a multipart `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
