//! Scrobble reporting client.

use crate::error::{Result, ServerClientError};
use crate::types::{ErrorResponse, ScrobbleEndpointConfig};
use aria_core::{ScrobbleReport, ScrobbleSink};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Path of the scrobble endpoint, relative to the server URL
pub const SCROBBLE_PATH: &str = "/api/scrobble";

/// Client that delivers scrobble reports to a remote server.
///
/// Reports are fire-and-forget: the client makes exactly one attempt per
/// report and never retries.
///
/// # Example
///
/// ```ignore
/// use aria_server_client::{ScrobbleClient, ScrobbleEndpointConfig};
///
/// let client = ScrobbleClient::new(ScrobbleEndpointConfig::new("https://music.example.com"))?;
/// client.submit_report(&report).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ScrobbleClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl ScrobbleClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ScrobbleEndpointConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let base = config.url.trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&base).map_err(|e| ServerClientError::InvalidUrl(format!("{}: {}", base, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(format!("Aria/{} (Headless)", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServerClientError::Request)?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", base, SCROBBLE_PATH),
            access_token: config.access_token,
        })
    }

    /// Full URL reports are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a single report.
    pub async fn submit_report(&self, report: &ScrobbleReport) -> Result<()> {
        debug!(
            track_id = %report.song_id,
            scrobble_type = report.scrobble_type.as_str(),
            "Submitting scrobble"
        );

        let mut request = self.http.post(&self.endpoint).json(report);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ServerClientError::ServerUnreachable(e.to_string())
            } else {
                ServerClientError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = error_message(response).await;
                warn!(status = status.as_u16(), "Scrobble endpoint rejected credentials");
                Err(ServerClientError::AuthFailed(message))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(ServerClientError::RateLimited { retry_after_secs })
            }
            _ => Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&text)
        .map(|body| body.error)
        .unwrap_or(text)
}

#[async_trait]
impl ScrobbleSink for ScrobbleClient {
    async fn submit(&self, report: &ScrobbleReport) -> aria_core::Result<()> {
        self.submit_report(report).await.map_err(Into::into)
    }
}
