//! Scripted executor for tests.

use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, DownloadResponse, HttpExecutor, UploadRequest};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A call observed by [`MockExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Api(ApiRequest),
    Upload(UploadRequest),
    Download { url: String, destination: PathBuf },
}

#[derive(Debug, Clone)]
enum MockReply {
    Response { status: u16, body: Vec<u8> },
    Failure(TransportError),
}

/// Executor that replays queued replies in order and records every call.
///
/// Each call, of any kind, consumes the next reply. Downloads write the
/// reply body to the destination when the status is 2xx. Once the queue is
/// empty, calls fail with a connection error.
#[derive(Debug, Default)]
pub struct MockExecutor {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockExecutor {
    /// Creates a mock with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON reply.
    #[must_use]
    pub fn with_json(self, status: u16, body: JsonValue) -> Self {
        self.with_bytes(status, body.to_string().into_bytes())
    }

    /// Queues a text reply.
    #[must_use]
    pub fn with_text(self, status: u16, body: &str) -> Self {
        self.with_bytes(status, body.as_bytes().to_vec())
    }

    /// Queues a raw reply.
    #[must_use]
    pub fn with_bytes(self, status: u16, body: Vec<u8>) -> Self {
        self.push(MockReply::Response { status, body });
        self
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn with_failure(self, error: TransportError) -> Self {
        self.push(MockReply::Failure(error));
        self
    }

    /// Returns every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the JSON API requests made so far, in order.
    #[must_use]
    pub fn api_requests(&self) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Api(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of calls of any kind.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    fn record(&self, call: MockCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn next_reply(&self) -> Result<(u16, Vec<u8>), TransportError> {
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(MockReply::Response { status, body }) => Ok((status, body)),
            Some(MockReply::Failure(error)) => Err(error),
            None => Err(TransportError::ConnectionFailed {
                url: "mock".to_string(),
                reason: "no scripted response left".to_string(),
            }),
        }
    }
}

#[async_trait]
impl HttpExecutor for MockExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.record(MockCall::Api(request));
        let (status, body) = self.next_reply()?;
        Ok(ApiResponse::new(status, body))
    }

    async fn upload(&self, request: UploadRequest) -> Result<ApiResponse, TransportError> {
        self.record(MockCall::Upload(request));
        let (status, body) = self.next_reply()?;
        Ok(ApiResponse::new(status, body))
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadResponse, TransportError> {
        self.record(MockCall::Download {
            url: url.to_string(),
            destination: destination.to_path_buf(),
        });
        let (status, body) = self.next_reply()?;
        if !(200..300).contains(&status) {
            return Ok(DownloadResponse {
                status,
                bytes_written: 0,
            });
        }
        tokio::fs::write(destination, &body)
            .await
            .map_err(|e| TransportError::LocalFile {
                path: destination.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(DownloadResponse {
            status,
            bytes_written: body.len() as u64,
        })
    }
}
