//! SQL requests and the fetch-by-key helper.
//!
//! Table and column names are interpolated into SQL text as given. Callers
//! are trusted to pass valid identifiers; nothing here escapes them, because
//! the API accepts exactly the SQL it is sent.

use crate::config::ConnectionConfig;
use crate::endpoint;
use crate::error::ApiError;
use crate::transport::{ApiRequest, HttpExecutor, HttpMethod};
use crate::value::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

/// Body of a `POST .../sql/` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlQuery {
    pub sql: String,
    /// Positional parameters for `?` placeholders; omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<JsonValue>,
    pub convert_keys: bool,
}

impl SqlQuery {
    /// Creates a query without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>, convert_keys: bool) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            convert_keys,
        }
    }

    /// Sets the positional parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<JsonValue>) -> Self {
        self.params = params;
        self
    }

    /// Builds the request for this query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be serialized.
    pub fn into_request(self, config: &ConnectionConfig) -> Result<ApiRequest, ApiError> {
        let body = serde_json::to_value(&self).map_err(|e| ApiError::UnexpectedResponse {
            reason: format!("serialize SQL query: {e}"),
        })?;
        Ok(
            ApiRequest::new(HttpMethod::Post, endpoint::sql_url(config), config.token())
                .with_body(body),
        )
    }
}

/// Builds the statement used by [`fetch_rows_for_key`].
#[must_use]
pub fn key_select_sql(table_name: &str, key_column: &str, limit: i64) -> String {
    format!("SELECT _id, {key_column} FROM {table_name} WHERE {key_column} IS NOT NULL LIMIT {limit}")
}

#[derive(Deserialize)]
struct SqlResults {
    results: Option<Vec<Row>>,
}

/// Extracts the rows from a SQL response body.
///
/// Accepts a `{results: [...]}` envelope of objects; if some entries are not
/// objects, falls back to keeping only the ones that are.
///
/// # Errors
///
/// Returns an error if the body has no `results` list.
pub fn parse_sql_rows(body: &[u8]) -> Result<Vec<Row>, ApiError> {
    if let Ok(SqlResults {
        results: Some(rows),
    }) = serde_json::from_slice::<SqlResults>(body)
    {
        return Ok(rows);
    }

    let parsed: JsonValue =
        serde_json::from_slice(body).map_err(|e| ApiError::UnexpectedResponse {
            reason: format!("parse SQL response: {e}"),
        })?;
    match parsed.get("results") {
        Some(JsonValue::Array(items)) => Ok(items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect()),
        _ => Err(ApiError::UnexpectedResponse {
            reason: "SQL response has no results list".to_string(),
        }),
    }
}

/// Fetches `_id` and `key_column` for up to `limit` rows whose key is not null.
///
/// # Errors
///
/// Returns an error if the call fails, answers with a non-2xx status, or the
/// body has no results list.
#[instrument(skip(http, config), fields(base = %config.base_uuid()))]
pub async fn fetch_rows_for_key(
    http: &dyn HttpExecutor,
    config: &ConnectionConfig,
    table_name: &str,
    key_column: &str,
    limit: i64,
) -> Result<Vec<Row>, ApiError> {
    let request = SqlQuery::new(key_select_sql(table_name, key_column, limit), true)
        .into_request(config)?;
    let response = http.execute(request).await?;
    if !response.is_success() {
        return Err(ApiError::UnexpectedStatus {
            status: response.status,
            body: response.text(),
        });
    }

    let rows = parse_sql_rows(&response.body)?;
    debug!(rows = rows.len(), "fetched key rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExecutor;
    use serde_json::json;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("https://s", "b1", "tok")
    }

    #[test]
    fn sql_query_omits_empty_params() {
        let body = serde_json::to_value(SqlQuery::new("SELECT 1", true)).expect("serialize");
        assert_eq!(body, json!({"sql": "SELECT 1", "convert_keys": true}));

        let body = serde_json::to_value(SqlQuery::new("SELECT ?", false).with_params(vec![json!(1)]))
            .expect("serialize");
        assert_eq!(
            body,
            json!({"sql": "SELECT ?", "params": [1], "convert_keys": false})
        );
    }

    #[test]
    fn key_select_statement() {
        assert_eq!(
            key_select_sql("Orders", "Customer", 250),
            "SELECT _id, Customer FROM Orders WHERE Customer IS NOT NULL LIMIT 250"
        );
    }

    #[test]
    fn parse_typed_results() {
        let rows = parse_sql_rows(br#"{"results":[{"_id":"r1","k":"A"}],"metadata":[]}"#)
            .expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["_id"], "r1");
    }

    #[test]
    fn parse_falls_back_to_object_entries() {
        let rows = parse_sql_rows(br#"{"results":[{"_id":"r1"}, 5, null, {"_id":"r2"}]}"#)
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["_id"], "r2");
    }

    #[test]
    fn parse_rejects_missing_results() {
        let err = parse_sql_rows(br#"{"error_message":"bad sql"}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { .. }));

        let err = parse_sql_rows(b"<html>").unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { .. }));
    }

    #[tokio::test]
    async fn fetch_rows_for_key_posts_bounded_select() {
        let mock = MockExecutor::new().with_json(
            200,
            json!({"results": [{"_id": "r1", "Code": "A"}, {"_id": "r2", "Code": "B"}]}),
        );

        let rows = fetch_rows_for_key(&mock, &config(), "Products", "Code", 500)
            .await
            .expect("rows");
        assert_eq!(rows.len(), 2);

        let requests = mock.api_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "https://s/api-gateway/api/v2/dtables/b1/sql/");
        assert_eq!(requests[0].token, "tok");
        assert_eq!(
            requests[0].body,
            Some(json!({
                "sql": "SELECT _id, Code FROM Products WHERE Code IS NOT NULL LIMIT 500",
                "convert_keys": true
            }))
        );
    }

    #[tokio::test]
    async fn fetch_rows_for_key_fails_on_error_status() {
        let mock = MockExecutor::new().with_json(404, json!({"error_msg": "table not found"}));

        let err = fetch_rows_for_key(&mock, &config(), "Nope", "Code", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 404, .. }));
    }
}
