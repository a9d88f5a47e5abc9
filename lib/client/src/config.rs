//! Connection settings and HTTP configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Settings for one SeaTable base.
///
/// Immutable once created; the registry hands out shared references.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    server: String,
    base_uuid: String,
    token: String,
}

impl ConnectionConfig {
    /// Creates a connection config.
    ///
    /// The server URL is trimmed and loses any trailing slashes so endpoint
    /// paths can be appended directly.
    #[must_use]
    pub fn new(
        server: impl Into<String>,
        base_uuid: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let server: String = server.into();
        let base_uuid: String = base_uuid.into();
        Self {
            server: server.trim().trim_end_matches('/').to_string(),
            base_uuid: base_uuid.trim().to_string(),
            token: token.into(),
        }
    }

    /// Returns the server URL without a trailing slash.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the base UUID.
    #[must_use]
    pub fn base_uuid(&self) -> &str {
        &self.base_uuid
    }

    /// Returns the base token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("base_uuid", &self.base_uuid)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Timeouts and identification for outgoing HTTP calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for JSON API calls, in seconds.
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Timeout for multipart attachment uploads, in seconds.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Timeout for streamed file downloads, in seconds.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    60
}

fn default_download_timeout_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    concat!("seatable-nodes/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: default_api_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Timeout applied to JSON API calls.
    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Timeout applied to attachment uploads.
    #[must_use]
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    /// Timeout applied to file downloads.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
