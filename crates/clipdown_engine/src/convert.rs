use std::time::{Duration, Instant};

use clip_logging::{clip_debug, clip_warn};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ConvertError, FailureKind};

/// Header identifying the client build to the conversion service.
pub const CLIENT_VERSION_HEADER: &str = "x-client-version";

const DEFAULT_ENDPOINT: &str = "https://convert.clipdown.dev/api/convert";

/// Fixed ceiling for one conversion call. No retry or backoff; a retry is
/// always a fresh user action.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ConvertSettings {
    pub endpoint: Url,
    pub request_timeout: Duration,
    pub client_version: String,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint url"),
            request_timeout: REQUEST_TIMEOUT,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The conversion seam: exactly one of {markdown, error} per call, never
/// partial or streamed.
#[async_trait::async_trait]
pub trait ConvertService: Send + Sync {
    async fn convert(&self, html: &str) -> Result<String, ConvertError>;
}

#[derive(Debug, Clone)]
pub struct RemoteConverter {
    settings: ConvertSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ConvertRequestBody<'a> {
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl RemoteConverter {
    pub fn new(settings: ConvertSettings) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| ConvertError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn request(&self, html: &str) -> Result<String, ConvertError> {
        let response = self
            .client
            .post(self.settings.endpoint.clone())
            .header(CLIENT_VERSION_HEADER, &self.settings.client_version)
            .json(&ConvertRequestBody { html })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let fallback = format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            );
            // A structured body is preferred; anything unparsable falls back
            // to the status line.
            let message = match response.text().await {
                Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
                    Ok(parsed) => parsed.message,
                    Err(_) => fallback,
                },
                Err(_) => fallback,
            };
            return Err(ConvertError::new(
                FailureKind::Server {
                    status: status.as_u16(),
                },
                message,
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("text/markdown") && !content_type.contains("text/plain") {
            clip_warn!("conversion endpoint returned unexpected content type: {content_type}");
        }

        let markdown = response.text().await.map_err(map_transport_error)?;
        if markdown.trim().is_empty() {
            return Err(ConvertError::new(
                FailureKind::EmptyResponse,
                "the conversion service returned an empty body",
            ));
        }
        Ok(markdown)
    }
}

#[async_trait::async_trait]
impl ConvertService for RemoteConverter {
    async fn convert(&self, html: &str) -> Result<String, ConvertError> {
        let started = Instant::now();
        // The ceiling races the whole call. On expiry the in-flight future is
        // dropped, which aborts the request and releases the connection.
        let outcome = tokio::time::timeout(self.settings.request_timeout, self.request(html)).await;
        match outcome {
            Ok(result) => {
                clip_debug!(
                    "conversion round trip finished in {} ms",
                    started.elapsed().as_millis()
                );
                result
            }
            Err(_elapsed) => {
                let seconds = self.settings.request_timeout.as_secs();
                clip_warn!("conversion call cancelled after {seconds}s ceiling");
                Err(ConvertError::new(
                    FailureKind::Timeout,
                    format!("no response within {seconds}s"),
                ))
            }
        }
    }
}

fn map_transport_error(err: reqwest::Error) -> ConvertError {
    if err.is_timeout() {
        return ConvertError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_connect() {
        return ConvertError::new(FailureKind::Connect, err.to_string());
    }
    ConvertError::new(FailureKind::Network, err.to_string())
}
