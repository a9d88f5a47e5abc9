//! Download File: resolves a download link and optionally saves the file.

use crate::context::{NodeContext, optional, required};
use crate::error::NodeError;
use seatable_client::{download_to, get_download_link};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFileInput {
    #[serde(default)]
    pub client_id: String,
    /// Path of the file inside the base.
    #[serde(default)]
    pub file_path: String,
    /// Local destination; only the link is resolved when absent.
    #[serde(default)]
    pub save_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFileOutput {
    pub status_code: u16,
    pub download_url: String,
    /// Empty when nothing was saved.
    pub saved_path: String,
    pub file_size: u64,
}

/// Resolves the link and, when a save path is given, downloads the file.
///
/// # Errors
///
/// Returns an error if the client is unknown, the path is blank, the link
/// cannot be resolved, or the transfer fails.
#[instrument(skip_all, fields(file_path = %input.file_path))]
pub async fn run(
    ctx: &NodeContext<'_>,
    input: DownloadFileInput,
) -> Result<DownloadFileOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let file_path = required(&input.file_path, "File Path is required")?;
    let save_path = optional(input.save_path.as_deref());

    let download_url = get_download_link(ctx.http(), &config, &file_path)
        .await
        .map_err(|e| NodeError::from_api("get download link", e))?;

    let Some(save_path) = save_path else {
        return Ok(DownloadFileOutput {
            status_code: 200,
            download_url,
            saved_path: String::new(),
            file_size: 0,
        });
    };

    let file_size = download_to(ctx.http(), &download_url, Path::new(&save_path))
        .await
        .map_err(|e| NodeError::from_api("download", e))?;
    info!(save_path = %save_path, file_size, "downloaded file");
    Ok(DownloadFileOutput {
        status_code: 200,
        download_url,
        saved_path: save_path,
        file_size,
    })
}
