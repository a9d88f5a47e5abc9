//! HTTP request execution.
//!
//! Every call is a single attempt with a fixed timeout. The status code is
//! returned verbatim; deciding whether a non-2xx answer is an error belongs
//! to the caller.

use crate::config::HttpConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// HTTP methods used by the SeaTable API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// An authenticated JSON API request.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Bearer token; no Authorization header is sent when blank.
    pub token: String,
    /// JSON body, serialized with a JSON content type when present.
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            token: token.into(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url, token)
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("body", &self.body)
            .finish()
    }
}

/// Raw outcome of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<JsonValue> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A multipart file upload to the SeaTable file server.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub url: String,
    pub file_name: String,
    pub data: Vec<u8>,
    /// Sent as the `parent_dir` form field.
    pub parent_dir: String,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("url", &self.url)
            .field("file_name", &self.file_name)
            .field("size", &self.data.len())
            .field("parent_dir", &self.parent_dir)
            .finish()
    }
}

/// Outcome of a streamed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadResponse {
    pub status: u16,
    /// Zero when the status was not 2xx; nothing is written in that case.
    pub bytes_written: u64,
}

impl DownloadResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP calls against SeaTable.
///
/// This abstraction allows testing nodes without a server.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Performs a JSON API call.
    ///
    /// Sets `Accept: application/json`, a bearer `Authorization` header when
    /// the token is not blank, and a JSON content type when a body is given.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;

    /// Uploads a file as multipart form data.
    async fn upload(&self, request: UploadRequest) -> Result<ApiResponse, TransportError>;

    /// Streams the body of a GET to `destination`.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResponse, TransportError>;
}

/// `HttpExecutor` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
    config: HttpConfig,
}

impl ReqwestExecutor {
    /// Creates an executor with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::InvalidRequest {
                reason: format!("HTTP client error: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

fn send_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_builder() {
        TransportError::InvalidRequest {
            reason: err.to_string(),
        }
    } else {
        TransportError::ConnectionFailed {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

fn body_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::BodyRead {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

fn local_file_error(path: &Path, err: std::io::Error) -> TransportError {
    TransportError::LocalFile {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(self.config.api_timeout())
            .header(ACCEPT, "application/json");

        if !request.token.trim().is_empty() {
            builder = builder.bearer_auth(&request.token);
        }

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| TransportError::InvalidRequest {
                reason: format!("marshal request body: {e}"),
            })?;
            builder = builder.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            send_error(&request.url, e)
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| body_error(&request.url, e))?;

        debug!(status, bytes = body.len(), "request completed");
        Ok(ApiResponse::new(status, body.to_vec()))
    }

    #[instrument(skip(self, request), fields(url = %request.url, file = %request.file_name, size = request.data.len()))]
    async fn upload(&self, request: UploadRequest) -> Result<ApiResponse, TransportError> {
        let part = reqwest::multipart::Part::bytes(request.data).file_name(request.file_name);
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("parent_dir", request.parent_dir);

        let response = self
            .client
            .post(&request.url)
            .timeout(self.config.upload_timeout())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "upload failed");
                send_error(&request.url, e)
            })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| body_error(&request.url, e))?;

        debug!(status, "upload completed");
        Ok(ApiResponse::new(status, body.to_vec()))
    }

    #[instrument(skip(self, destination), fields(destination = %destination.display()))]
    async fn download(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResponse, TransportError> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.config.download_timeout())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "download failed");
                send_error(url, e)
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(DownloadResponse {
                status,
                bytes_written: 0,
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| local_file_error(destination, e))?;
        let mut bytes_written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| body_error(url, e))? {
            file.write_all(&chunk)
                .await
                .map_err(|e| local_file_error(destination, e))?;
            bytes_written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| local_file_error(destination, e))?;

        debug!(status, bytes_written, "download completed");
        Ok(DownloadResponse {
            status,
            bytes_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(301, "").is_success());
        assert!(!ApiResponse::new(404, "").is_success());
    }

    #[test]
    fn response_json_is_none_for_non_json() {
        assert!(ApiResponse::new(502, "Bad Gateway").json().is_none());
        assert_eq!(
            ApiResponse::new(200, r#"{"ok":true}"#).json(),
            Some(serde_json::json!({"ok": true}))
        );
    }

    #[test]
    fn request_debug_redacts_token() {
        let request = ApiRequest::get("https://s/api/", "secret-token");
        assert!(!format!("{request:?}").contains("secret-token"));
    }

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(reqwest::Method::from(HttpMethod::Put), reqwest::Method::PUT);
    }
}
