use std::future::Future;
use std::time::Duration;

use reqwest::{multipart, Client, Url};

use crate::error::DashError;
use crate::types::{DetectionResponse, ImageUpload, SuspectList, UploadResponse};

/// The HTTP surface of the remote matching service, as consumed by the dashboard.
///
/// Implementations must not retry on their own; retry policy belongs to callers.
pub trait Backend: Send + Sync + 'static {
    /// `GET /check`: latest verdict from the live camera.
    fn check(&self) -> impl Future<Output = Result<DetectionResponse, DashError>> + Send;

    /// `POST /detect`: single-shot verdict for one uploaded image.
    fn detect(
        &self,
        image: ImageUpload,
    ) -> impl Future<Output = Result<DetectionResponse, DashError>> + Send;

    /// `GET /suspects`: every registered suspect name.
    fn list_suspects(&self) -> impl Future<Output = Result<Vec<String>, DashError>> + Send;

    /// `POST /upload?name=<name>`: register a new suspect photo.
    fn upload_suspect(
        &self,
        name: &str,
        image: ImageUpload,
    ) -> impl Future<Output = Result<(), DashError>> + Send;

    /// `DELETE /suspects/<name>`.
    fn remove_suspect(&self, name: &str) -> impl Future<Output = Result<(), DashError>> + Send;
}

/// [`Backend`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// `connect_timeout` bounds connection setup only; whole-request timeouts
    /// are applied by the callers that own the policy.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, DashError> {
        let base = parse_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(concat!("suspect-watch-rs/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Address of the MJPEG live feed. The dashboard hands it to the browser untouched.
    pub fn video_url(&self) -> String {
        self.endpoint(&["video"]).to_string()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Parse and check a backend base URL. Only http(s) is accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, DashError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| DashError::Validation(format!("invalid backend url {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DashError::Validation(format!(
            "backend url must be http or https, got {other}"
        ))),
    }
}

fn image_part(image: ImageUpload) -> Result<multipart::Part, DashError> {
    let part = multipart::Part::bytes(image.bytes).file_name(image.file_name);
    match image.content_type {
        Some(ct) => part
            .mime_str(&ct)
            .map_err(|e| DashError::Validation(format!("invalid content type {ct:?}: {e}"))),
        None => Ok(part),
    }
}

impl Backend for HttpBackend {
    async fn check(&self) -> Result<DetectionResponse, DashError> {
        let resp = self
            .client
            .get(self.endpoint(&["check"]))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn detect(&self, image: ImageUpload) -> Result<DetectionResponse, DashError> {
        let form = multipart::Form::new().part("file", image_part(image)?);
        let resp = self
            .client
            .post(self.endpoint(&["detect"]))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn list_suspects(&self) -> Result<Vec<String>, DashError> {
        let resp = self
            .client
            .get(self.endpoint(&["suspects"]))
            .send()
            .await?
            .error_for_status()?;
        let list: SuspectList = resp.json().await?;
        Ok(list.suspects)
    }

    async fn upload_suspect(&self, name: &str, image: ImageUpload) -> Result<(), DashError> {
        let form = multipart::Form::new().part("file", image_part(image)?);
        let resp = self
            .client
            .post(self.endpoint(&["upload"]))
            .query(&[("name", name)])
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        let body: UploadResponse = resp.json().await?;
        if body.is_success() {
            Ok(())
        } else {
            Err(DashError::Rejected(
                body.message.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    async fn remove_suspect(&self, name: &str) -> Result<(), DashError> {
        let resp = self
            .client
            .delete(self.endpoint(&["suspects", name]))
            .send()
            .await?
            .error_for_status()?;
        // Any 2xx counts, unless the body explicitly says otherwise.
        let text = resp.text().await?;
        match serde_json::from_str::<UploadResponse>(&text) {
            Ok(body) if body.status == "error" => Err(DashError::Rejected(
                body.message.unwrap_or_else(|| "unknown error".to_string()),
            )),
            _ => Ok(()),
        }
    }
}
