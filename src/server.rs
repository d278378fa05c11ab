use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Multipart, Path as UrlPath, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    backend::Backend,
    clock::{Clock, ClockTicker},
    config::Config,
    controller::{ScanController, ScanOutcome},
    detector::DetectionClient,
    error::DashError,
    registration::{failure_status, Registration, RemovalOutcome, SYSTEM_ERROR_STATUS},
    roster::RosterSync,
    session::{Session, SessionSnapshot},
    types::{ImageUpload, LogEntry, SuspectList},
};

/// Everything the dashboard handlers share.
pub struct AppState<B> {
    pub controller: ScanController<B>,
    pub roster: RosterSync<B>,
    pub registration: Registration<B>,
    pub detector: DetectionClient<B>,
    ticker: Arc<ClockTicker>,
    video_url: Arc<str>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            roster: self.roster.clone(),
            registration: self.registration.clone(),
            detector: self.detector.clone(),
            ticker: self.ticker.clone(),
            video_url: self.video_url.clone(),
        }
    }
}

impl<B: Backend> AppState<B> {
    /// Wire session, controller, roster and registration around one backend.
    /// Must be called from within a tokio runtime (the clock ticker starts here).
    pub fn new(backend: Arc<B>, config: &Config, clock: Arc<dyn Clock>, video_url: impl Into<String>) -> Self {
        let session = Session::new(clock.clone());
        let detector = DetectionClient::new(backend.clone(), config.request_timeout());
        let controller = ScanController::new(session.clone(), detector.clone(), config.auto_scan_period());
        let roster = RosterSync::new(backend.clone(), config.request_timeout());
        let registration = Registration::new(backend, session, roster.clone(), config.request_timeout());
        Self {
            controller,
            roster,
            registration,
            detector,
            ticker: Arc::new(ClockTicker::spawn(clock, config.clock_period())),
            video_url: Arc::from(video_url.into()),
        }
    }

    pub fn session(&self) -> &Session {
        self.controller.session()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub time: String,
    pub video_url: String,
    pub suspects: usize,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AutoScanRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
struct StatusMessage {
    status: &'static str,
    message: String,
}

impl StatusMessage {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self { status: "success", message: message.into() })
    }

    fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self { status: "error", message: message.into() })
    }
}

/// Build the dashboard router: JSON API under `/api`, static UI everywhere else.
pub fn router<B: Backend>(state: AppState<B>, ui_dir: &Path) -> Router {
    let api = Router::new()
        .route("/status", get(get_status::<B>))
        .route("/logs", get(get_logs::<B>))
        .route("/scan", post(post_scan::<B>))
        .route("/auto", post(post_auto::<B>))
        .route("/suspects", get(get_suspects::<B>).post(post_suspect::<B>))
        .route("/suspects/{name}", delete(delete_suspect::<B>))
        .route("/detect", post(post_detect::<B>))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state);

    let static_svc = ServeDir::new(ui_dir).append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
}

/// Serve the dashboard until Ctrl+C.
pub async fn spawn_server<B: Backend>(bind: &str, state: AppState<B>, ui_dir: &Path) -> Result<()> {
    let app = router(state, ui_dir);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("serving dashboard on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;
    Ok(())
}

async fn get_status<B: Backend>(State(app): State<AppState<B>>) -> impl IntoResponse {
    let view = StatusView {
        time: app.ticker.current(),
        video_url: app.video_url.to_string(),
        suspects: app.roster.snapshot().await.len(),
        session: app.session().snapshot().await,
    };
    (StatusCode::OK, Json(view))
}

async fn get_logs<B: Backend>(State(app): State<AppState<B>>) -> Json<Vec<LogEntry>> {
    Json(app.session().entries().await)
}

async fn post_scan<B: Backend>(State(app): State<AppState<B>>) -> impl IntoResponse {
    let outcome = app.controller.trigger_manual_scan().await;
    let code = match outcome {
        ScanOutcome::Completed(_) => StatusCode::OK,
        ScanOutcome::Skipped => StatusCode::CONFLICT,
    };
    (code, Json(outcome))
}

async fn post_auto<B: Backend>(
    State(app): State<AppState<B>>,
    Json(req): Json<AutoScanRequest>,
) -> Json<AutoScanRequest> {
    app.controller.set_auto_scan(req.enabled).await;
    Json(AutoScanRequest {
        enabled: app.controller.auto_scan_enabled().await,
    })
}

async fn get_suspects<B: Backend>(State(app): State<AppState<B>>) -> Json<SuspectList> {
    Json(SuspectList {
        suspects: app.roster.snapshot().await,
    })
}

async fn post_suspect<B: Backend>(
    State(app): State<AppState<B>>,
    Query(q): Query<RegisterQuery>,
    multipart: Multipart,
) -> impl IntoResponse {
    let image = match read_image(multipart).await {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable registration upload");
            app.session().set_registration_status(SYSTEM_ERROR_STATUS).await;
            return (StatusCode::BAD_REQUEST, StatusMessage::error(e.to_string()));
        }
    };
    match app.registration.register(&q.name, image).await {
        Ok(status) => (StatusCode::OK, StatusMessage::success(status)),
        Err(DashError::Validation(msg)) => (StatusCode::BAD_REQUEST, StatusMessage::error(msg)),
        Err(e) => (StatusCode::BAD_GATEWAY, StatusMessage::error(failure_status(&e))),
    }
}

async fn delete_suspect<B: Backend>(
    State(app): State<AppState<B>>,
    UrlPath(name): UrlPath<String>,
    Query(q): Query<RemoveQuery>,
) -> impl IntoResponse {
    let outcome = app.registration.unregister(&name, q.confirm.into()).await;
    let code = match outcome {
        RemovalOutcome::Removed => StatusCode::OK,
        RemovalOutcome::Cancelled => StatusCode::BAD_REQUEST,
        RemovalOutcome::Failed => StatusCode::BAD_GATEWAY,
    };
    (code, Json(outcome))
}

async fn post_detect<B: Backend>(State(app): State<AppState<B>>, multipart: Multipart) -> axum::response::Response {
    match read_image(multipart).await {
        Ok(Some(image)) if !image.is_empty() => Json(app.detector.detect_image(image).await).into_response(),
        Ok(_) => (StatusCode::BAD_REQUEST, StatusMessage::error("missing image file")).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, StatusMessage::error(e.to_string())).into_response(),
    }
}

/// Pull the `file` field out of a multipart upload.
async fn read_image(mut multipart: Multipart) -> Result<Option<ImageUpload>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}
