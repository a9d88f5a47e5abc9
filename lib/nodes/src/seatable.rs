//! SeaTable connector: dispatches named operations to the nodes.

use crate::connector::{
    Connector, ConnectorCapability, ConnectorInfo, Operation, OperationInfo, OperationMetadata,
    OperationResult,
};
use crate::context::{CountingExecutor, NodeContext};
use crate::error::NodeError;
use crate::node::{
    auto_link, connect, download_file, get_row, link, metadata, rows, rows_get_many, search,
    sql_query, upload_attachment,
};
use async_trait::async_trait;
use seatable_client::{ClientRegistry, HttpExecutor};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{instrument, warn};

/// Operations the connector knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Connect,
    SqlQuery,
    Rows,
    RowsGetMany,
    Search,
    GetRow,
    Link,
    AutoLink,
    UploadAttachment,
    DownloadFile,
    GetMetadata,
    ListColumns,
    ListViews,
}

impl OperationKind {
    /// Every operation, in listing order.
    pub const ALL: [Self; 13] = [
        Self::Connect,
        Self::SqlQuery,
        Self::Rows,
        Self::RowsGetMany,
        Self::Search,
        Self::GetRow,
        Self::Link,
        Self::AutoLink,
        Self::UploadAttachment,
        Self::DownloadFile,
        Self::GetMetadata,
        Self::ListColumns,
        Self::ListViews,
    ];

    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::SqlQuery => "sql_query",
            Self::Rows => "rows",
            Self::RowsGetMany => "rows_get_many",
            Self::Search => "search",
            Self::GetRow => "get_row",
            Self::Link => "link",
            Self::AutoLink => "auto_link",
            Self::UploadAttachment => "upload_attachment",
            Self::DownloadFile => "download_file",
            Self::GetMetadata => "get_metadata",
            Self::ListColumns => "list_columns",
            Self::ListViews => "list_views",
        }
    }

    const fn description(&self) -> &'static str {
        match self {
            Self::Connect => "Register connection settings and return a client ID",
            Self::SqlQuery => "Run a SQL statement against the base",
            Self::Rows => "List, append, update or delete rows",
            Self::RowsGetMany => "List rows page by page up to a row cap",
            Self::Search => "Search columns for a keyword",
            Self::GetRow => "Fetch one row by ID",
            Self::Link => "Add, replace or remove links between rows",
            Self::AutoLink => "Link rows of two tables by matching key columns",
            Self::UploadAttachment => "Upload a local file as an attachment",
            Self::DownloadFile => "Resolve a download link and optionally save the file",
            Self::GetMetadata => "Fetch the base metadata",
            Self::ListColumns => "List the columns of a table",
            Self::ListViews => "List the views of a table",
        }
    }

    const fn capability(&self) -> ConnectorCapability {
        match self {
            Self::Connect => ConnectorCapability::Connect,
            Self::SqlQuery | Self::Rows => ConnectorCapability::WriteRows,
            Self::RowsGetMany | Self::Search | Self::GetRow => ConnectorCapability::ReadRows,
            Self::Link | Self::AutoLink => ConnectorCapability::ManageLinks,
            Self::UploadAttachment | Self::DownloadFile => ConnectorCapability::TransferFiles,
            Self::GetMetadata | Self::ListColumns | Self::ListViews => {
                ConnectorCapability::ReadSchema
            }
        }
    }

    const fn required_inputs(&self) -> &'static [&'static str] {
        match self {
            Self::Connect => &["serverUrl", "baseUuid", "baseToken"],
            Self::SqlQuery => &["clientId", "sql"],
            Self::Rows | Self::RowsGetMany | Self::ListColumns | Self::ListViews => {
                &["clientId", "tableName"]
            }
            Self::Search => &["clientId", "tableName", "columns", "keyword"],
            Self::GetRow => &["clientId", "tableName", "rowId"],
            Self::Link => &[
                "clientId",
                "operation",
                "linkId",
                "tableName",
                "otherTableName",
                "rowId",
            ],
            Self::AutoLink => &[
                "clientId",
                "tableName",
                "otherTableName",
                "linkId",
                "leftKeyColumn",
                "rightKeyColumn",
            ],
            Self::UploadAttachment | Self::DownloadFile => &["clientId", "filePath"],
            Self::GetMetadata => &["clientId"],
        }
    }
}

impl FromStr for OperationKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NodeError::OperationNotSupported {
                operation: s.to_string(),
            })
    }
}

/// Connector over a client registry and an HTTP executor.
///
/// Both are injected, so several connectors can share one registry and
/// tests can run against a mock executor.
#[derive(Clone)]
pub struct SeaTableConnector {
    registry: Arc<ClientRegistry>,
    http: Arc<dyn HttpExecutor>,
}

impl SeaTableConnector {
    /// Creates a connector.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>, http: Arc<dyn HttpExecutor>) -> Self {
        Self { registry, http }
    }

    /// Returns the client registry.
    #[must_use]
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    async fn dispatch(
        &self,
        kind: OperationKind,
        ctx: &NodeContext<'_>,
        parameters: JsonValue,
    ) -> Result<JsonValue, NodeError> {
        match kind {
            OperationKind::Connect => output(connect::run(ctx, input(kind, parameters)?)?),
            OperationKind::SqlQuery => output(sql_query::run(ctx, input(kind, parameters)?).await?),
            OperationKind::Rows => output(rows::run(ctx, input(kind, parameters)?).await?),
            OperationKind::RowsGetMany => {
                output(rows_get_many::run(ctx, input(kind, parameters)?).await?)
            }
            OperationKind::Search => output(search::run(ctx, input(kind, parameters)?).await?),
            OperationKind::GetRow => output(get_row::run(ctx, input(kind, parameters)?).await?),
            OperationKind::Link => output(link::run(ctx, input(kind, parameters)?).await?),
            OperationKind::AutoLink => output(auto_link::run(ctx, input(kind, parameters)?).await?),
            OperationKind::UploadAttachment => {
                output(upload_attachment::run(ctx, input(kind, parameters)?).await?)
            }
            OperationKind::DownloadFile => {
                output(download_file::run(ctx, input(kind, parameters)?).await?)
            }
            OperationKind::GetMetadata => {
                output(metadata::get_metadata(ctx, input(kind, parameters)?).await?)
            }
            OperationKind::ListColumns => {
                output(metadata::list_columns(ctx, input(kind, parameters)?).await?)
            }
            OperationKind::ListViews => {
                output(metadata::list_views(ctx, input(kind, parameters)?).await?)
            }
        }
    }
}

fn input<T: DeserializeOwned>(kind: OperationKind, parameters: JsonValue) -> Result<T, NodeError> {
    let parameters = match parameters {
        JsonValue::Null => JsonValue::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(parameters).map_err(|e| {
        NodeError::invalid(format!("invalid parameters for '{}': {e}", kind.as_str()))
    })
}

fn output<T: Serialize>(value: T) -> Result<JsonValue, NodeError> {
    serde_json::to_value(value).map_err(|e| NodeError::protocol(format!("serialize output: {e}")))
}

#[async_trait]
impl Connector for SeaTableConnector {
    fn info(&self) -> ConnectorInfo {
        ConnectorInfo {
            id: "seatable".to_string(),
            name: "SeaTable".to_string(),
            description: "SeaTable bases over the REST and SQL API".to_string(),
            operations: OperationKind::ALL
                .iter()
                .map(|kind| OperationInfo {
                    name: kind.as_str().to_string(),
                    description: kind.description().to_string(),
                    required_inputs: kind
                        .required_inputs()
                        .iter()
                        .map(|s| (*s).to_string())
                        .collect(),
                    capability: kind.capability(),
                })
                .collect(),
        }
    }

    #[instrument(skip(self, operation), fields(operation = %operation.name))]
    async fn execute(&self, operation: Operation) -> Result<OperationResult, NodeError> {
        let kind: OperationKind = operation.name.parse()?;

        let started = Instant::now();
        let counting = CountingExecutor::new(self.http.as_ref());
        let ctx = NodeContext::new(&self.registry, &counting);
        let outcome = self.dispatch(kind, &ctx, operation.parameters).await;

        let metadata = OperationMetadata::since(started, counting.calls());
        Ok(match outcome {
            Ok(data) => OperationResult::success(data, metadata),
            Err(err) => {
                warn!(error = %err, api_calls = metadata.api_calls, "operation failed");
                OperationResult::failure(err.to_string(), metadata)
            }
        })
    }
}
