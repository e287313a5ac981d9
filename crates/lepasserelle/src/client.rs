// HTTP Collaborators
//
// *Le Client* (The Client) - reqwest implementations of the journey's collaborator traits

use async_trait::async_trait;
use leparcours::{
    Area, AreaDirectory, BackendReply, Credential, ProposalBackend, SubmissionRequest,
    TransportError, UploadHandle, UploadRequest, UploadService, UploadStatusReport,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::errors::{transport, truncate_body, Result};

/// First wait before retrying a read
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Longest wait between read retries
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

/// Wait before retry number `attempt` (1-based): doubling, capped.
pub fn retry_delay(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    RETRY_BASE_DELAY.saturating_mul(factor).min(RETRY_MAX_DELAY)
}

/// Join a base URL and a path with exactly one slash.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Read a JSON body, falling back to a status error for non-JSON failures.
async fn read_json(response: Response) -> std::result::Result<Value, TransportError> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate_body(&text),
        }),
        Err(err) => Err(TransportError::Decode(err.to_string())),
    }
}

/// Require a success status, then decode the `data` member of an envelope
/// (or the whole body when there is no envelope).
async fn read_data<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, TransportError> {
    let status = response.status();
    let body = read_json(response).await?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate_body(&body.to_string()),
        });
    }
    let data = match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(data).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Shared reqwest client with the gateway's limits
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Build a client for a validated configuration
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// GET with up to `retries` further attempts on transport errors and 5xx.
    async fn get(
        &self,
        url: &str,
        credential: &Credential,
        retries: u32,
    ) -> std::result::Result<Response, TransportError> {
        let mut attempt = 0;
        loop {
            let outcome = self
                .http
                .get(url)
                .bearer_auth(credential.expose())
                .send()
                .await;
            match outcome {
                Ok(response) if response.status().is_server_error() && attempt < retries => {
                    warn!(url, status = %response.status(), attempt, "Retrying read");
                }
                Ok(response) => return Ok(response),
                Err(err) if attempt < retries => {
                    warn!(url, error = %err, attempt, "Retrying read");
                }
                Err(err) => return Err(transport(err)),
            }
            attempt += 1;
            tokio::time::sleep(retry_delay(attempt)).await;
        }
    }

    /// Single POST; never retried.
    async fn post(
        &self,
        url: &str,
        body: &impl serde::Serialize,
        credential: &Credential,
    ) -> std::result::Result<Response, TransportError> {
        self.http
            .post(url)
            .bearer_auth(credential.expose())
            .json(body)
            .send()
            .await
            .map_err(transport)
    }
}

/// Backend proposal API and area directory over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: GatewayClient,
}

impl HttpBackend {
    /// Wrap a gateway client
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.client.config.backend_url, path)
    }
}

#[async_trait]
impl ProposalBackend for HttpBackend {
    async fn submit(
        &self,
        request: &SubmissionRequest,
        credential: &Credential,
    ) -> std::result::Result<BackendReply, TransportError> {
        let url = self.url("proposals");
        debug!(url = %url, level = %request.level, "POST proposal");
        let response = self.client.post(&url, request, credential).await?;
        // Unsuccessful statuses still carry the `{ success: false, .. }` envelope.
        Ok(BackendReply::from_body(read_json(response).await?))
    }
}

#[async_trait]
impl AreaDirectory for HttpBackend {
    async fn area(
        &self,
        id: i64,
        credential: &Credential,
    ) -> std::result::Result<Option<Area>, TransportError> {
        let url = self.url(&format!("areas/{id}"));
        let response = self
            .client
            .get(&url, credential, self.client.config.read_retries)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_data(response).await.map(Some)
    }
}

/// File-upload service over HTTP
#[derive(Debug, Clone)]
pub struct HttpUploadService {
    client: GatewayClient,
}

impl HttpUploadService {
    /// Wrap a gateway client
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.client.config.upload_url, path)
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadLink {
    download_url: String,
}

#[async_trait]
impl UploadService for HttpUploadService {
    async fn initiate(
        &self,
        request: &UploadRequest,
        credential: &Credential,
    ) -> std::result::Result<UploadHandle, TransportError> {
        let url = self.url("uploads");
        debug!(url = %url, entity_id = %request.entity_id, "POST upload");
        read_data(self.client.post(&url, request, credential).await?).await
    }

    async fn status(
        &self,
        upload_id: &str,
        credential: &Credential,
    ) -> std::result::Result<UploadStatusReport, TransportError> {
        let url = self.url(&format!("uploads/{upload_id}/status"));
        read_data(self.client.get(&url, credential, 0).await?).await
    }

    async fn download_url(
        &self,
        upload_id: &str,
        credential: &Credential,
    ) -> std::result::Result<String, TransportError> {
        let url = self.url(&format!("uploads/{upload_id}/download"));
        let response = self
            .client
            .get(&url, credential, self.client.config.read_retries)
            .await?;
        read_data::<DownloadLink>(response)
            .await
            .map(|link| link.download_url)
    }
}
