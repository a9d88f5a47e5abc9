//! Upload Attachment: uploads a local file to the base's asset storage.

use crate::context::{NodeContext, optional, required};
use crate::error::NodeError;
use seatable_client::{get_upload_link, upload_file};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, instrument};

/// Which relative path the attachment is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentKind {
    #[default]
    File,
    Image,
}

impl FromStr for AttachmentKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "file" => Ok(Self::File),
            "image" => Ok(Self::Image),
            other => Err(NodeError::invalid(format!("Unsupported kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttachmentInput {
    #[serde(default)]
    pub client_id: String,
    /// Local file to upload.
    #[serde(default)]
    pub file_path: String,
    /// Defaults to the base name of `file_path`.
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttachmentOutput {
    pub status_code: u16,
    /// First element of the upload response.
    pub attachment: JsonValue,
    pub relative_path: String,
}

/// Uploads the file and returns the attachment object.
///
/// # Errors
///
/// Returns an error if the client is unknown, the path is blank, the file
/// cannot be read, or any step of the upload fails.
#[instrument(skip_all, fields(file_path = %input.file_path))]
pub async fn run(
    ctx: &NodeContext<'_>,
    input: UploadAttachmentInput,
) -> Result<UploadAttachmentOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let file_path = required(&input.file_path, "File Path is required")?;
    let kind: AttachmentKind = input.kind.parse()?;

    let path = Path::new(&file_path);
    let file_name = match optional(input.file_name.as_deref()) {
        Some(name) => name,
        None => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| NodeError::invalid("File Path has no file name"))?,
    };
    let data = tokio::fs::read(path).await.map_err(|e| NodeError::Io {
        path: file_path.clone(),
        reason: e.to_string(),
    })?;

    let link = get_upload_link(ctx.http(), &config)
        .await
        .map_err(|e| NodeError::from_api("get upload link", e))?;
    let (status_code, attachment) = upload_file(ctx.http(), &config, &link, &file_name, data)
        .await
        .map_err(|e| NodeError::from_api("upload", e))?;

    let relative_path = if kind == AttachmentKind::Image && !link.image_relative_path.is_empty() {
        link.image_relative_path
    } else {
        link.file_relative_path
    };
    info!(file_name = %file_name, relative_path = %relative_path, "uploaded attachment");
    Ok(UploadAttachmentOutput {
        status_code,
        attachment: JsonValue::Object(attachment),
        relative_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client::{ClientRegistry, ConnectionConfig, MockCall, MockExecutor};
    use serde_json::json;

    fn link() -> JsonValue {
        json!({
            "upload_link": "up-1",
            "parent_path": "/asset/b1",
            "file_relative_path": "files/2024-05",
            "image_relative_path": "images/2024-05"
        })
    }

    fn input(client_id: &str, file_path: &str, kind: &str) -> UploadAttachmentInput {
        serde_json::from_value(json!({
            "clientId": client_id,
            "filePath": file_path,
            "kind": kind,
        }))
        .expect("input")
    }

    #[tokio::test]
    async fn uploads_file_under_its_base_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("report.txt");
        std::fs::write(&file, b"hello").expect("write");

        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        let http = MockExecutor::new()
            .with_json(200, link())
            .with_json(200, json!([{"name": "report.txt", "size": 5}]));
        let ctx = NodeContext::new(&registry, &http);

        let output = run(&ctx, input(id.as_str(), &file.display().to_string(), "file"))
            .await
            .expect("output");

        assert_eq!(output.status_code, 200);
        assert_eq!(output.attachment["name"], "report.txt");
        assert_eq!(output.relative_path, "files/2024-05");
        match &http.calls()[1] {
            MockCall::Upload(request) => {
                assert_eq!(request.file_name, "report.txt");
                assert_eq!(request.data, b"hello");
                assert_eq!(request.parent_dir, "/asset/b1");
            }
            other => panic!("expected upload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn image_kind_uses_image_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("logo.png");
        std::fs::write(&file, b"png").expect("write");

        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        let http = MockExecutor::new()
            .with_json(200, link())
            .with_json(200, json!([{"name": "logo.png"}]));
        let ctx = NodeContext::new(&registry, &http);

        let output = run(&ctx, input(id.as_str(), &file.display().to_string(), "image"))
            .await
            .expect("output");
        assert_eq!(output.relative_path, "images/2024-05");
    }

    #[tokio::test]
    async fn failed_upload_link_is_remote_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"a").expect("write");

        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        let http = MockExecutor::new().with_text(401, "bad token");
        let ctx = NodeContext::new(&registry, &http);

        let err = run(&ctx, input(id.as_str(), &file.display().to_string(), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Remote { status: 401, .. }));
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        let http = MockExecutor::new();
        let ctx = NodeContext::new(&registry, &http);

        let missing = dir.path().join("missing.txt");
        let err = run(&ctx, input(id.as_str(), &missing.display().to_string(), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Io { .. }));
        assert_eq!(http.call_count(), 0);
    }
}
