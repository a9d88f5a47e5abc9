//! Offset-based bulk row listing.
//!
//! Pages are requested strictly in order. The loop stops at the first of:
//! the max-rows cap is reached, a page comes back empty, or a page comes
//! back shorter than requested.

use crate::config::ConnectionConfig;
use crate::endpoint;
use crate::error::ApiError;
use crate::transport::{ApiRequest, HttpExecutor};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

/// Page size used when the requested one is out of range.
pub const DEFAULT_PAGE_SIZE: i64 = 1000;

/// Largest page the API serves.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Cap used when no positive max-rows is given.
pub const DEFAULT_MAX_ROWS: i64 = 10_000;

/// Parameters of a bulk listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub table_name: String,
    pub view_name: Option<String>,
    pub start: i64,
    pub page_size: i64,
    pub max_rows: i64,
    pub convert_keys: bool,
}

impl PageRequest {
    /// Creates a request for `table_name` with default bounds.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            view_name: None,
            start: 0,
            page_size: DEFAULT_PAGE_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
            convert_keys: true,
        }
    }

    /// Restricts the listing to a view. Blank names are ignored.
    #[must_use]
    pub fn with_view(mut self, view_name: Option<String>) -> Self {
        self.view_name = view_name
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        self
    }

    /// Sets the start offset, page size and row cap.
    #[must_use]
    pub fn with_bounds(mut self, start: i64, page_size: i64, max_rows: i64) -> Self {
        self.start = start;
        self.page_size = page_size;
        self.max_rows = max_rows;
        self
    }

    /// Sets the `convert_keys` flag.
    #[must_use]
    pub fn with_convert_keys(mut self, convert_keys: bool) -> Self {
        self.convert_keys = convert_keys;
        self
    }

    /// Returns a copy with out-of-range bounds replaced by defaults.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if !(1..=MAX_PAGE_SIZE).contains(&out.page_size) {
            out.page_size = DEFAULT_PAGE_SIZE;
        }
        if out.max_rows <= 0 {
            out.max_rows = DEFAULT_MAX_ROWS;
        }
        out.start = out.start.max(0);
        out
    }

    fn page_url(&self, config: &ConnectionConfig, offset: i64, limit: i64) -> Result<String, ApiError> {
        let mut query = vec![("table_name", self.table_name.clone())];
        if let Some(view) = &self.view_name {
            query.push(("view_name", view.clone()));
        }
        query.push(("start", offset.to_string()));
        query.push(("limit", limit.to_string()));
        if self.convert_keys {
            query.push(("convert_keys", "true".to_string()));
        }
        Ok(endpoint::with_query(&endpoint::rows_url(config), query)?)
    }
}

/// Rows accumulated by [`fetch_all_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    pub rows: Vec<JsonValue>,
    /// Number of rows in `rows`.
    pub count: usize,
    /// Start offset after normalization.
    pub start: i64,
    /// Status of the last page request.
    pub status: u16,
    /// Number of page requests made.
    pub pages: usize,
}

fn page_rows(body: &[u8]) -> Result<Vec<JsonValue>, ApiError> {
    let parsed: JsonValue =
        serde_json::from_slice(body).map_err(|e| ApiError::UnexpectedResponse {
            reason: format!("unmarshal list rows response: {e}"),
        })?;
    match parsed {
        JsonValue::Array(rows) => Ok(rows),
        JsonValue::Object(mut map) => match map.remove("rows") {
            Some(JsonValue::Array(rows)) => Ok(rows),
            Some(JsonValue::Null) | None => Ok(Vec::new()),
            Some(_) => Err(ApiError::UnexpectedResponse {
                reason: "unmarshal list rows response: rows is not a list".to_string(),
            }),
        },
        _ => Err(ApiError::UnexpectedResponse {
            reason: "unmarshal list rows response: not an object or list".to_string(),
        }),
    }
}

/// Lists rows page by page until the table or the cap is exhausted.
///
/// A non-2xx page is not an error: the loop stops there and the batch
/// reports that status together with the rows gathered before it.
///
/// # Errors
///
/// Returns an error on a transport failure or when a 2xx page body is not a
/// row listing.
#[instrument(skip(http, config, request), fields(table = %request.table_name))]
pub async fn fetch_all_rows(
    http: &dyn HttpExecutor,
    config: &ConnectionConfig,
    request: &PageRequest,
) -> Result<RowBatch, ApiError> {
    let request = request.normalized();
    let mut batch = RowBatch {
        rows: Vec::new(),
        count: 0,
        start: request.start,
        status: 0,
        pages: 0,
    };
    let mut offset = request.start;

    loop {
        let fetched = batch.rows.len() as i64;
        if fetched >= request.max_rows {
            break;
        }
        let limit = request.page_size.min(request.max_rows - fetched);

        let url = request.page_url(config, offset, limit)?;
        let response = http.execute(ApiRequest::get(url, config.token())).await?;
        batch.pages += 1;
        batch.status = response.status;
        if !response.is_success() {
            debug!(status = response.status, offset, "page request rejected");
            break;
        }

        let page = page_rows(&response.body)?;
        let returned = page.len() as i64;
        debug!(offset, limit, returned, "fetched page");

        // Oversized pages are cut so the cap always holds.
        let take = usize::try_from(returned.min(request.max_rows - fetched)).unwrap_or(0);
        batch.rows.extend(page.into_iter().take(take));
        offset += returned;

        if returned == 0 || returned < limit {
            break;
        }
    }

    batch.count = batch.rows.len();
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExecutor;
    use serde_json::json;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("https://s", "b1", "tok")
    }

    fn page(start: usize, len: usize) -> JsonValue {
        let rows: Vec<JsonValue> = (start..start + len)
            .map(|i| json!({"_id": format!("r{i}")}))
            .collect();
        json!({ "rows": rows })
    }

    #[test]
    fn normalization_replaces_out_of_range_bounds() {
        let request = PageRequest::new("T").with_bounds(-5, 5000, 0).normalized();
        assert_eq!(request.start, 0);
        assert_eq!(request.page_size, 1000);
        assert_eq!(request.max_rows, 10_000);

        let request = PageRequest::new("T").with_bounds(3, 0, -1).normalized();
        assert_eq!(request.page_size, 1000);
        assert_eq!(request.max_rows, 10_000);

        let request = PageRequest::new("T").with_bounds(3, 250, 700).normalized();
        assert_eq!((request.start, request.page_size, request.max_rows), (3, 250, 700));
    }

    #[test]
    fn blank_view_is_dropped() {
        let request = PageRequest::new("T").with_view(Some("  ".to_string()));
        assert_eq!(request.view_name, None);
    }

    #[tokio::test]
    async fn stops_on_short_page() {
        let mock = MockExecutor::new()
            .with_json(200, page(0, 1000))
            .with_json(200, page(1000, 1000))
            .with_json(200, page(2000, 400));

        let batch = fetch_all_rows(&mock, &config(), &PageRequest::new("Orders"))
            .await
            .expect("batch");

        assert_eq!(batch.count, 2400);
        assert_eq!(batch.rows.len(), 2400);
        assert_eq!(batch.pages, 3);
        assert_eq!(batch.status, 200);
        assert_eq!(mock.call_count(), 3);

        let urls: Vec<String> = mock.api_requests().into_iter().map(|r| r.url).collect();
        assert!(urls[0].contains("start=0&limit=1000"));
        assert!(urls[1].contains("start=1000&limit=1000"));
        assert!(urls[2].contains("start=2000&limit=1000"));
    }

    #[tokio::test]
    async fn cap_limits_first_request() {
        let mock = MockExecutor::new().with_json(200, page(0, 1000));
        let request = PageRequest::new("Orders").with_bounds(0, 1000, 500);

        let batch = fetch_all_rows(&mock, &config(), &request)
            .await
            .expect("batch");

        assert_eq!(mock.call_count(), 1);
        assert!(mock.api_requests()[0].url.contains("limit=500"));
        assert_eq!(batch.count, 500);
    }

    #[tokio::test]
    async fn empty_first_page_makes_one_call() {
        let mock = MockExecutor::new().with_json(200, json!({"rows": []}));

        let batch = fetch_all_rows(&mock, &config(), &PageRequest::new("Orders"))
            .await
            .expect("batch");

        assert!(batch.rows.is_empty());
        assert_eq!(batch.count, 0);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn start_offset_is_reported_and_used() {
        let mock = MockExecutor::new().with_json(200, page(0, 3));
        let request = PageRequest::new("Orders")
            .with_view(Some("Open".to_string()))
            .with_bounds(40, 10, 100);

        let batch = fetch_all_rows(&mock, &config(), &request)
            .await
            .expect("batch");

        assert_eq!(batch.start, 40);
        assert_eq!(
            mock.api_requests()[0].url,
            "https://s/api-gateway/api/v2/dtables/b1/rows/?table_name=Orders&view_name=Open&start=40&limit=10&convert_keys=true"
        );
    }

    #[tokio::test]
    async fn top_level_array_page_is_accepted() {
        let mock = MockExecutor::new().with_json(200, json!([{"_id": "a"}, {"_id": "b"}]));

        let batch = fetch_all_rows(&mock, &config(), &PageRequest::new("T"))
            .await
            .expect("batch");
        assert_eq!(batch.count, 2);
    }

    #[tokio::test]
    async fn error_status_ends_listing_without_failing() {
        let mock = MockExecutor::new()
            .with_json(200, page(0, 1000))
            .with_json(403, json!({"error_msg": "no permission"}));

        let batch = fetch_all_rows(&mock, &config(), &PageRequest::new("T"))
            .await
            .expect("batch");
        assert_eq!(batch.status, 403);
        assert_eq!(batch.count, 1000);
        assert_eq!(batch.pages, 2);
    }

    #[tokio::test]
    async fn malformed_page_is_an_error() {
        let mock = MockExecutor::new().with_text(200, "not json");

        let err = fetch_all_rows(&mock, &config(), &PageRequest::new("T"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unmarshal list rows response"));
    }
}
