//! Attachment upload and file download helpers.
//!
//! Both flows chain two calls, so unlike the pass-through requests a
//! non-2xx answer at any step is an error.

use crate::config::ConnectionConfig;
use crate::endpoint;
use crate::error::{ApiError, TransportError};
use crate::transport::{ApiRequest, ApiResponse, HttpExecutor, UploadRequest};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::{debug, instrument};

/// One-time upload target returned by the upload-link endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadLink {
    #[serde(default)]
    pub upload_link: String,
    #[serde(default)]
    pub parent_path: String,
    #[serde(default)]
    pub file_relative_path: String,
    #[serde(default)]
    pub image_relative_path: String,
}

fn check_status(response: &ApiResponse) -> Result<(), ApiError> {
    if response.status >= 300 {
        return Err(ApiError::UnexpectedStatus {
            status: response.status,
            body: response.text(),
        });
    }
    Ok(())
}

/// Requests an upload link for the base.
///
/// # Errors
///
/// Returns an error on a transport failure, a status of 300 or above, a body
/// that does not parse, or an empty `upload_link`.
#[instrument(skip_all, fields(base = %config.base_uuid()))]
pub async fn get_upload_link(
    http: &dyn HttpExecutor,
    config: &ConnectionConfig,
) -> Result<UploadLink, ApiError> {
    let response = http
        .execute(ApiRequest::get(
            endpoint::upload_link_url(config),
            config.token(),
        ))
        .await?;
    check_status(&response)?;

    let link: UploadLink =
        serde_json::from_slice(&response.body).map_err(|e| ApiError::UnexpectedResponse {
            reason: format!("parse upload link: {e}"),
        })?;
    if link.upload_link.is_empty() {
        return Err(ApiError::UnexpectedResponse {
            reason: "upload_link is empty".to_string(),
        });
    }
    Ok(link)
}

/// Uploads `data` through `link` and returns the status and first attachment.
///
/// # Errors
///
/// Returns an error on a transport failure, a status of 300 or above, or a
/// body that is not a non-empty list of objects.
#[instrument(skip(http, config, link, data), fields(size = data.len()))]
pub async fn upload_file(
    http: &dyn HttpExecutor,
    config: &ConnectionConfig,
    link: &UploadLink,
    file_name: &str,
    data: Vec<u8>,
) -> Result<(u16, serde_json::Map<String, JsonValue>), ApiError> {
    let response = http
        .upload(UploadRequest {
            url: endpoint::upload_api_url(config, &link.upload_link),
            file_name: file_name.to_string(),
            data,
            parent_dir: link.parent_path.clone(),
        })
        .await?;
    check_status(&response)?;

    let attachments: Vec<serde_json::Map<String, JsonValue>> =
        serde_json::from_slice(&response.body).map_err(|e| ApiError::UnexpectedResponse {
            reason: format!("parse upload response: {e}"),
        })?;
    let attachment =
        attachments
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::UnexpectedResponse {
                reason: "no attachment returned".to_string(),
            })?;
    debug!(status = response.status, "uploaded attachment");
    Ok((response.status, attachment))
}

/// Resolves a file path inside the base to a download URL.
///
/// # Errors
///
/// Returns an error on a transport failure, a status of 300 or above, or a
/// body without a non-empty `download_link`.
#[instrument(skip(http, config), fields(base = %config.base_uuid()))]
pub async fn get_download_link(
    http: &dyn HttpExecutor,
    config: &ConnectionConfig,
    path: &str,
) -> Result<String, ApiError> {
    let url = endpoint::download_link_url(config, path)?;
    let response = http.execute(ApiRequest::get(url, config.token())).await?;
    check_status(&response)?;

    let parsed: JsonValue =
        serde_json::from_slice(&response.body).map_err(|e| ApiError::UnexpectedResponse {
            reason: format!("parse download link response: {e}"),
        })?;
    match parsed.get("download_link").and_then(JsonValue::as_str) {
        Some(link) if !link.is_empty() => Ok(link.to_string()),
        _ => Err(ApiError::UnexpectedResponse {
            reason: "download_link not found in response".to_string(),
        }),
    }
}

/// Downloads `url` to `save_path`, creating missing parent directories.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns an error if a directory cannot be created, the transfer fails, or
/// the status is 300 or above. Nothing is written in the last case.
#[instrument(skip(http, url), fields(save_path = %save_path.display()))]
pub async fn download_to(
    http: &dyn HttpExecutor,
    url: &str,
    save_path: &Path,
) -> Result<u64, ApiError> {
    if let Some(parent) = save_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransportError::LocalFile {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
    }

    let response = http.download(url, save_path).await?;
    if response.status >= 300 {
        return Err(ApiError::UnexpectedStatus {
            status: response.status,
            body: String::new(),
        });
    }
    Ok(response.bytes_written)
}
