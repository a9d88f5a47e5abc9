//! Rows Get Many: lists a table page by page up to a row cap.

use crate::context::{NodeContext, default_true, required};
use crate::error::NodeError;
use seatable_client::paginate::{DEFAULT_MAX_ROWS, DEFAULT_PAGE_SIZE};
use seatable_client::{PageRequest, fetch_all_rows};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsGetManyInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub view_name: Option<String>,
    #[serde(default)]
    pub start: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_max_rows")]
    pub max_rows: i64,
    #[serde(default = "default_true")]
    pub convert_keys: bool,
}

const fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

const fn default_max_rows() -> i64 {
    DEFAULT_MAX_ROWS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsGetManyOutput {
    /// Status of the last page request.
    pub status_code: u16,
    pub rows: Vec<JsonValue>,
    /// `{rows, count, start}`.
    pub json: JsonValue,
}

/// Fetches rows until the table is exhausted or `maxRows` is reached.
///
/// # Errors
///
/// Returns an error if the client is unknown, the table name is blank, a
/// call cannot be made, or a page is not a row listing.
#[instrument(skip_all, fields(table = %input.table_name))]
pub async fn run(
    ctx: &NodeContext<'_>,
    input: RowsGetManyInput,
) -> Result<RowsGetManyOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let table_name = required(&input.table_name, "Table Name is required")?;

    let request = PageRequest::new(table_name)
        .with_view(input.view_name)
        .with_bounds(input.start, input.page_size, input.max_rows)
        .with_convert_keys(input.convert_keys);
    let batch = fetch_all_rows(ctx.http(), &config, &request)
        .await
        .map_err(|e| NodeError::from_api("list rows", e))?;

    info!(rows = batch.count, pages = batch.pages, status = batch.status, "fetched rows");
    let json = json!({
        "rows": batch.rows,
        "count": batch.count,
        "start": batch.start,
    });
    Ok(RowsGetManyOutput {
        status_code: batch.status,
        rows: batch.rows,
        json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client::{ClientRegistry, ConnectionConfig, MockExecutor};

    #[tokio::test]
    async fn gathers_pages_into_one_listing() {
        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        let http = MockExecutor::new()
            .with_json(200, json!({"rows": [{"_id": "a"}, {"_id": "b"}]}))
            .with_json(200, json!({"rows": [{"_id": "c"}]}));
        let ctx = NodeContext::new(&registry, &http);

        let input: RowsGetManyInput = serde_json::from_value(json!({
            "clientId": id.as_str(),
            "tableName": "Orders",
            "start": 5,
            "pageSize": 2,
        }))
        .expect("input");
        let output = run(&ctx, input).await.expect("output");

        assert_eq!(output.status_code, 200);
        assert_eq!(output.rows.len(), 3);
        assert_eq!(output.json["count"], 3);
        assert_eq!(output.json["start"], 5);
        assert_eq!(http.call_count(), 2);
        assert!(http.api_requests()[1].url.contains("start=7&limit=2"));
    }

    #[tokio::test]
    async fn blank_table_is_rejected() {
        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        let http = MockExecutor::new();
        let ctx = NodeContext::new(&registry, &http);

        let input: RowsGetManyInput =
            serde_json::from_value(json!({"clientId": id.as_str(), "tableName": " "}))
                .expect("input");
        let err = run(&ctx, input).await.unwrap_err();
        assert!(err.to_string().contains("Table Name is required"));
    }
}
