//! Rows: list, append, update or delete rows of one table.

use crate::context::{NodeContext, ResponseOutput, default_true, optional, required};
use crate::error::NodeError;
use seatable_client::{ApiRequest, HttpMethod, endpoint};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::str::FromStr;
use tracing::{debug, instrument};

/// What to do with the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowsAction {
    List,
    Append,
    Update,
    Delete,
}

impl FromStr for RowsAction {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "list" => Ok(Self::List),
            "append" => Ok(Self::Append),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(NodeError::invalid("Unsupported action for Rows")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub view_name: Option<String>,
    #[serde(default)]
    pub start: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_true")]
    pub convert_keys: bool,
    #[serde(default)]
    pub row_id: Option<String>,
    #[serde(default)]
    pub row_data: Option<JsonValue>,
}

const fn default_limit() -> i64 {
    1000
}

pub type RowsOutput = ResponseOutput;

fn row_data(input: &RowsInput, action: &str) -> Result<JsonValue, NodeError> {
    match &input.row_data {
        None | Some(JsonValue::Null) => Err(NodeError::invalid(format!(
            "Row Data is required for {action}"
        ))),
        Some(data) => Ok(data.clone()),
    }
}

fn row_id(input: &RowsInput, action: &str) -> Result<String, NodeError> {
    optional(input.row_id.as_deref())
        .ok_or_else(|| NodeError::invalid(format!("Row ID is required for {action}")))
}

/// Performs the action and returns the response as is.
///
/// # Errors
///
/// Returns an error if the client is unknown, the table name is blank, the
/// action is not supported, an input the action needs is missing, or the
/// call cannot be made.
#[instrument(skip_all, fields(action = %input.action, table = %input.table_name))]
pub async fn run(ctx: &NodeContext<'_>, input: RowsInput) -> Result<RowsOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let table_name = required(&input.table_name, "Table Name is required")?;
    let action: RowsAction = input.action.parse()?;
    let rows_url = endpoint::rows_url(&config);

    let request = match action {
        RowsAction::List => {
            let mut query = vec![("table_name", table_name)];
            if let Some(view) = optional(input.view_name.as_deref()) {
                query.push(("view_name", view));
            }
            if input.start > 0 {
                query.push(("start", input.start.to_string()));
            }
            if input.limit > 0 {
                query.push(("limit", input.limit.to_string()));
            }
            if input.convert_keys {
                query.push(("convert_keys", "true".to_string()));
            }
            ApiRequest::get(endpoint::with_query(&rows_url, query)?, config.token())
        }
        RowsAction::Append => {
            let row = row_data(&input, "append")?;
            ApiRequest::new(HttpMethod::Post, rows_url, config.token())
                .with_body(json!({"table_name": table_name, "row": row}))
        }
        RowsAction::Update => {
            let row_id = row_id(&input, "update")?;
            let row = row_data(&input, "update")?;
            ApiRequest::new(HttpMethod::Put, rows_url, config.token()).with_body(
                json!({"table_name": table_name, "row_id": row_id, "row": row}),
            )
        }
        RowsAction::Delete => {
            let row_id = row_id(&input, "delete")?;
            ApiRequest::new(HttpMethod::Delete, rows_url, config.token())
                .with_body(json!({"table_name": table_name, "row_id": row_id}))
        }
    };

    let response = ctx.http().execute(request).await?;
    debug!(status = response.status, "rows request completed");
    Ok(ResponseOutput::from(&response))
}
