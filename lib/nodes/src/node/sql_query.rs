//! SQL Query: runs a statement against the base.

use crate::context::{NodeContext, ResponseOutput, default_true, required};
use crate::error::NodeError;
use seatable_client::SqlQuery;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQueryInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub sql: String,
    /// Positional parameters. Anything other than a list is ignored.
    #[serde(default)]
    pub params: Option<JsonValue>,
    #[serde(default = "default_true")]
    pub convert_keys: bool,
}

pub type SqlQueryOutput = ResponseOutput;

/// Posts the statement and returns the response as is.
///
/// # Errors
///
/// Returns an error if the client is unknown, the SQL is blank, or the call
/// cannot be made.
#[instrument(skip_all)]
pub async fn run(ctx: &NodeContext<'_>, input: SqlQueryInput) -> Result<SqlQueryOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    if input.sql.trim().is_empty() {
        return Err(NodeError::invalid("SQL is required"));
    }

    let params = match input.params {
        Some(JsonValue::Array(params)) => params,
        _ => Vec::new(),
    };
    let request = SqlQuery::new(input.sql, input.convert_keys)
        .with_params(params)
        .into_request(&config)
        .map_err(|e| NodeError::from_api("build SQL request", e))?;

    let response = ctx.http().execute(request).await?;
    debug!(status = response.status, "sql query completed");
    Ok(ResponseOutput::from(&response))
}
