//! Get Row: fetches one row by ID.

use crate::context::{NodeContext, ResponseOutput, default_true, optional, required};
use crate::error::NodeError;
use seatable_client::{ApiRequest, endpoint};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRowInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub row_id: String,
    #[serde(default)]
    pub view_name: Option<String>,
    #[serde(default = "default_true")]
    pub convert_keys: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRowOutput {
    #[serde(flatten)]
    pub response: ResponseOutput,
    /// The `row` object, or the whole document when there is none.
    pub row: Option<JsonValue>,
}

/// Fetches the row.
///
/// # Errors
///
/// Returns an error if the client is unknown, the table name or row ID is
/// blank, or the call cannot be made.
#[instrument(skip_all, fields(table = %input.table_name, row_id = %input.row_id))]
pub async fn run(ctx: &NodeContext<'_>, input: GetRowInput) -> Result<GetRowOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let table_name = required(&input.table_name, "Table Name is required")?;
    let row_id = required(&input.row_id, "Row ID is required")?;

    let mut query = vec![("table_name", table_name)];
    if let Some(view) = optional(input.view_name.as_deref()) {
        query.push(("view_name", view));
    }
    if input.convert_keys {
        query.push(("convert_keys", "true".to_string()));
    }
    let url = endpoint::with_query(&endpoint::row_url(&config, &row_id), query)?;

    let response = ctx.http().execute(ApiRequest::get(url, config.token())).await?;
    let response = ResponseOutput::from(&response);
    debug!(status = response.status_code, "get row completed");

    let row = match &response.json {
        Some(JsonValue::Object(map)) if map.contains_key("row") => map.get("row").cloned(),
        other => other.clone(),
    };
    Ok(GetRowOutput { response, row })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client::{ClientRegistry, ConnectionConfig, MockExecutor};
    use serde_json::json;

    fn setup(http: MockExecutor) -> (ClientRegistry, String, MockExecutor) {
        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        (registry, id.to_string(), http)
    }

    #[tokio::test]
    async fn extracts_row_object() {
        let (registry, id, http) =
            setup(MockExecutor::new().with_json(200, json!({"row": {"_id": "r1", "Name": "A"}})));
        let ctx = NodeContext::new(&registry, &http);

        let input: GetRowInput = serde_json::from_value(json!({
            "clientId": id,
            "tableName": "Contacts",
            "rowId": "r1",
        }))
        .expect("input");
        let output = run(&ctx, input).await.expect("output");

        assert_eq!(output.row, Some(json!({"_id": "r1", "Name": "A"})));
        assert_eq!(
            http.api_requests()[0].url,
            "https://s/api-gateway/api/v2/dtables/b1/rows/r1/?table_name=Contacts&convert_keys=true"
        );
    }

    #[tokio::test]
    async fn falls_back_to_whole_document() {
        let (registry, id, http) =
            setup(MockExecutor::new().with_json(200, json!({"_id": "r1", "Name": "A"})));
        let ctx = NodeContext::new(&registry, &http);

        let input: GetRowInput = serde_json::from_value(json!({
            "clientId": id,
            "tableName": "Contacts",
            "rowId": "r1",
            "convertKeys": false,
        }))
        .expect("input");
        let output = run(&ctx, input).await.expect("output");

        assert_eq!(output.row, Some(json!({"_id": "r1", "Name": "A"})));
        assert!(!http.api_requests()[0].url.contains("convert_keys"));
    }

    #[tokio::test]
    async fn missing_row_id_is_rejected() {
        let (registry, id, http) = setup(MockExecutor::new());
        let ctx = NodeContext::new(&registry, &http);

        let input: GetRowInput =
            serde_json::from_value(json!({"clientId": id, "tableName": "Contacts"}))
                .expect("input");
        let err = run(&ctx, input).await.unwrap_err();
        assert!(err.to_string().contains("Row ID is required"));
    }
}
