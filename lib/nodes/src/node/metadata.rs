//! Schema nodes: Get Metadata, List Columns and List Views.

use crate::context::{NodeContext, ResponseOutput, optional, required};
use crate::error::NodeError;
use seatable_client::{ApiRequest, endpoint};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMetadataInput {
    #[serde(default)]
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMetadataOutput {
    #[serde(flatten)]
    pub response: ResponseOutput,
    pub tables: JsonValue,
}

/// Picks `metadata.tables`, then a root-level `tables`, then an empty list.
fn tables_of(json: Option<&JsonValue>) -> JsonValue {
    let Some(json) = json else {
        return JsonValue::Array(Vec::new());
    };
    json.get("metadata")
        .filter(|m| m.is_object())
        .and_then(|m| m.get("tables"))
        .or_else(|| json.get("tables"))
        .filter(|t| !t.is_null())
        .cloned()
        .unwrap_or_else(|| JsonValue::Array(Vec::new()))
}

/// Fetches the base metadata.
///
/// # Errors
///
/// Returns an error if the client is unknown or the call cannot be made.
#[instrument(skip_all)]
pub async fn get_metadata(
    ctx: &NodeContext<'_>,
    input: GetMetadataInput,
) -> Result<GetMetadataOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let response = ctx
        .http()
        .execute(ApiRequest::get(endpoint::metadata_url(&config), config.token()))
        .await?;
    let response = ResponseOutput::from(&response);
    debug!(status = response.status_code, "metadata fetched");

    let tables = tables_of(response.json.as_ref());
    Ok(GetMetadataOutput { response, tables })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListColumnsInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub view_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListColumnsOutput {
    #[serde(flatten)]
    pub response: ResponseOutput,
    pub columns: Vec<JsonValue>,
    pub count: usize,
}

/// Lists the columns of a table, optionally as seen through a view.
///
/// # Errors
///
/// Returns an error if the client is unknown, the table name is blank, or
/// the call cannot be made.
#[instrument(skip_all, fields(table = %input.table_name))]
pub async fn list_columns(
    ctx: &NodeContext<'_>,
    input: ListColumnsInput,
) -> Result<ListColumnsOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let table_name = required(&input.table_name, "Table Name is required")?;

    let mut query = vec![("table_name", table_name)];
    if let Some(view) = optional(input.view_name.as_deref()) {
        query.push(("view_name", view));
    }
    let url = endpoint::with_query(&endpoint::columns_url(&config), query)?;
    let response = ctx.http().execute(ApiRequest::get(url, config.token())).await?;
    let response = ResponseOutput::from(&response);

    let columns = response.list_field("columns");
    debug!(status = response.status_code, columns = columns.len(), "columns listed");
    Ok(ListColumnsOutput {
        count: columns.len(),
        columns,
        response,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListViewsInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListViewsOutput {
    #[serde(flatten)]
    pub response: ResponseOutput,
    pub views: Vec<JsonValue>,
    pub count: usize,
}

/// Lists the views of a table.
///
/// # Errors
///
/// Returns an error if the client is unknown, the table name is blank, or
/// the call cannot be made.
#[instrument(skip_all, fields(table = %input.table_name))]
pub async fn list_views(
    ctx: &NodeContext<'_>,
    input: ListViewsInput,
) -> Result<ListViewsOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let table_name = required(&input.table_name, "Table Name is required")?;

    let url = endpoint::with_query(&endpoint::views_url(&config), [("table_name", table_name)])?;
    let response = ctx.http().execute(ApiRequest::get(url, config.token())).await?;
    let response = ResponseOutput::from(&response);

    let views = response.list_field("views");
    debug!(status = response.status_code, views = views.len(), "views listed");
    Ok(ListViewsOutput {
        count: views.len(),
        views,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client::{ClientRegistry, ConnectionConfig, MockExecutor};
    use serde_json::json;

    fn setup() -> (ClientRegistry, String) {
        let registry = ClientRegistry::new();
        let id = registry.register(ConnectionConfig::new("https://s", "b1", "tok"));
        (registry, id.to_string())
    }

    #[test]
    fn tables_lookup_order() {
        assert_eq!(
            tables_of(Some(&json!({"metadata": {"tables": [{"name": "A"}]}, "tables": []}))),
            json!([{"name": "A"}])
        );
        assert_eq!(
            tables_of(Some(&json!({"tables": [{"name": "B"}]}))),
            json!([{"name": "B"}])
        );
        assert_eq!(tables_of(Some(&json!({"metadata": {}}))), json!([]));
        assert_eq!(tables_of(None), json!([]));
    }

    #[tokio::test]
    async fn metadata_extracts_tables() {
        let (registry, id) = setup();
        let http = MockExecutor::new()
            .with_json(200, json!({"metadata": {"tables": [{"name": "Orders"}]}}));
        let ctx = NodeContext::new(&registry, &http);

        let output = get_metadata(&ctx, GetMetadataInput { client_id: id })
            .await
            .expect("output");

        assert_eq!(output.tables, json!([{"name": "Orders"}]));
        assert_eq!(
            http.api_requests()[0].url,
            "https://s/api-gateway/api/v2/dtables/b1/metadata/"
        );
    }

    #[tokio::test]
    async fn columns_with_view() {
        let (registry, id) = setup();
        let http = MockExecutor::new()
            .with_json(200, json!({"columns": [{"name": "Name"}, {"name": "Email"}]}));
        let ctx = NodeContext::new(&registry, &http);

        let output = list_columns(
            &ctx,
            ListColumnsInput {
                client_id: id,
                table_name: "Contacts".to_string(),
                view_name: Some("All".to_string()),
            },
        )
        .await
        .expect("output");

        assert_eq!(output.count, 2);
        assert_eq!(
            http.api_requests()[0].url,
            "https://s/api-gateway/api/v2/dtables/b1/columns/?table_name=Contacts&view_name=All"
        );
    }

    #[tokio::test]
    async fn views_on_error_status_are_empty() {
        let (registry, id) = setup();
        let http = MockExecutor::new().with_json(404, json!({"error_msg": "table not found"}));
        let ctx = NodeContext::new(&registry, &http);

        let output = list_views(
            &ctx,
            ListViewsInput {
                client_id: id,
                table_name: "Nope".to_string(),
            },
        )
        .await
        .expect("output");

        assert_eq!(output.response.status_code, 404);
        assert!(output.views.is_empty());
        assert_eq!(output.count, 0);
        assert_eq!(
            http.api_requests()[0].url,
            "https://s/api-gateway/api/v2/dtables/b1/views/?table_name=Nope"
        );
    }
}
