//! What a node runs against, plus the helpers every node shares.

use crate::error::NodeError;
use async_trait::async_trait;
use seatable_client::{
    ApiRequest, ApiResponse, ClientRegistry, ConnectionConfig, DownloadResponse, HttpExecutor,
    TransportError, UploadRequest,
};
use seatable_core::ClientId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

const UNKNOWN_CLIENT: &str = "Unknown Client ID - run connect first";

/// The registry and executor a node runs against.
#[derive(Clone, Copy)]
pub struct NodeContext<'a> {
    registry: &'a ClientRegistry,
    http: &'a dyn HttpExecutor,
}

impl<'a> NodeContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(registry: &'a ClientRegistry, http: &'a dyn HttpExecutor) -> Self {
        Self { registry, http }
    }

    /// Returns the client registry.
    #[must_use]
    pub fn registry(&self) -> &'a ClientRegistry {
        self.registry
    }

    /// Returns the HTTP executor.
    #[must_use]
    pub fn http(&self) -> &'a dyn HttpExecutor {
        self.http
    }

    /// Resolves a client ID to its connection settings.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the ID is blank or unknown.
    pub fn client(&self, client_id: &str) -> Result<Arc<ConnectionConfig>, NodeError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(NodeError::invalid(UNKNOWN_CLIENT));
        }
        self.registry
            .lookup(&ClientId::from(client_id))
            .ok_or_else(|| NodeError::invalid(UNKNOWN_CLIENT))
    }
}

/// Executor wrapper that counts the calls passing through it.
pub struct CountingExecutor<'a> {
    inner: &'a dyn HttpExecutor,
    calls: AtomicU32,
}

impl<'a> CountingExecutor<'a> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: &'a dyn HttpExecutor) -> Self {
        Self {
            inner,
            calls: AtomicU32::new(0),
        }
    }

    /// Returns the number of calls made so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    fn bump(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl HttpExecutor for CountingExecutor<'_> {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.bump();
        self.inner.execute(request).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<ApiResponse, TransportError> {
        self.bump();
        self.inner.upload(request).await
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResponse, TransportError> {
        self.bump();
        self.inner.download(url, destination).await
    }
}

/// Status, raw body and parsed JSON of a pass-through call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOutput {
    pub status_code: u16,
    pub body: String,
    /// Null when the body is not JSON.
    pub json: Option<JsonValue>,
}

impl From<&ApiResponse> for ResponseOutput {
    fn from(response: &ApiResponse) -> Self {
        Self {
            status_code: response.status,
            body: response.text(),
            json: response.json(),
        }
    }
}

impl ResponseOutput {
    /// Returns `json[key]` if it is a list, otherwise an empty list.
    #[must_use]
    pub fn list_field(&self, key: &str) -> Vec<JsonValue> {
        match self.json.as_ref().and_then(|json| json.get(key)) {
            Some(JsonValue::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

/// Returns the trimmed value, or an invalid-argument error if it is blank.
pub(crate) fn required(value: &str, message: &str) -> Result<String, NodeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NodeError::invalid(message));
    }
    Ok(value.to_string())
}

/// Returns the trimmed value if it is present and not blank.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) const fn default_true() -> bool {
    true
}
