//! Link: adds, replaces or removes links between rows of two tables.

use crate::context::{NodeContext, ResponseOutput, optional, required};
use crate::error::NodeError;
use seatable_client::{ApiRequest, HttpMethod, endpoint};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Link operation. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOperation {
    Add,
    Update,
    Remove,
}

impl FromStr for LinkOperation {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "remove" => Ok(Self::Remove),
            _ => Err(NodeError::invalid("Operation must be add, update or remove")),
        }
    }
}

/// Parses a row ID list given as `a, b ,c` or as a JSON array of strings.
///
/// # Errors
///
/// Returns an invalid-argument error if the value starts with `[` but is not
/// a JSON array of strings.
pub fn parse_row_ids(raw: &str) -> Result<Vec<String>, NodeError> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str(raw)
            .map_err(|e| NodeError::invalid(format!("parse Other Row IDs: {e}")));
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub link_id: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub other_table_name: String,
    #[serde(default)]
    pub row_id: String,
    /// Used by add and remove.
    #[serde(default)]
    pub other_row_id: Option<String>,
    /// Used by update: comma list or JSON array.
    #[serde(default)]
    pub other_row_ids: Option<String>,
}

pub type LinkOutput = ResponseOutput;

/// Sends the link request and returns the response as is.
///
/// # Errors
///
/// Returns an error if the client is unknown, a required input is blank,
/// the operation is not supported, or the call cannot be made.
#[instrument(skip_all, fields(operation = %input.operation, table = %input.table_name))]
pub async fn run(ctx: &NodeContext<'_>, input: LinkInput) -> Result<LinkOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let operation: LinkOperation = input.operation.parse()?;

    const REQUIRED: &str = "Link ID, Table, Other Table and Row ID are required";
    let link_id = required(&input.link_id, REQUIRED)?;
    let table_name = required(&input.table_name, REQUIRED)?;
    let other_table_name = required(&input.other_table_name, REQUIRED)?;
    let row_id = required(&input.row_id, REQUIRED)?;

    let (method, payload) = match operation {
        LinkOperation::Add | LinkOperation::Remove => {
            let (method, name) = if operation == LinkOperation::Add {
                (HttpMethod::Post, "add")
            } else {
                (HttpMethod::Delete, "remove")
            };
            let other_row_id = optional(input.other_row_id.as_deref()).ok_or_else(|| {
                NodeError::invalid(format!("Other Row ID is required for {name}"))
            })?;
            (
                method,
                json!({
                    "link_id": link_id,
                    "table_name": table_name,
                    "other_table_name": other_table_name,
                    "table_row_id": row_id,
                    "other_table_row_id": other_row_id,
                }),
            )
        }
        LinkOperation::Update => {
            let raw = optional(input.other_row_ids.as_deref())
                .ok_or_else(|| NodeError::invalid("Other Row IDs is required for update"))?;
            let ids = parse_row_ids(&raw)?;
            (
                HttpMethod::Put,
                json!({
                    "link_id": link_id,
                    "table_name": table_name,
                    "other_table_name": other_table_name,
                    "row_id": row_id,
                    "other_rows_ids": ids,
                }),
            )
        }
    };

    let request =
        ApiRequest::new(method, endpoint::links_url(&config), config.token()).with_body(payload);
    let response = ctx.http().execute(request).await?;
    debug!(status = response.status, "link request completed");
    Ok(ResponseOutput::from(&response))
}
