//! Auto Link: links rows of two tables whose key columns hold equal values.
//!
//! The right table is indexed in memory by key, then every left row is
//! probed against the index. A matched left row gets one link update that
//! replaces its whole link set with the matched right rows. The first
//! failing update aborts the run; updates already sent are not undone.

use crate::context::{NodeContext, required};
use crate::error::NodeError;
use seatable_client::value::ROW_ID_COLUMN;
use seatable_client::{ApiRequest, HttpMethod, Row, endpoint, fetch_rows_for_key, row_string};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

const DEFAULT_MAX_ROWS: i64 = 1000;
const MODE_OVERRIDE: &str = "override";

/// Right-table row IDs grouped by key value, in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyIndex {
    entries: HashMap<String, Vec<String>>,
}

impl KeyIndex {
    /// Indexes `rows` by `key_column`. Rows with an empty key or ID are left out.
    #[must_use]
    pub fn build(rows: &[Row], key_column: &str) -> Self {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let key = row_string(row, key_column);
            let id = row_string(row, ROW_ID_COLUMN);
            if key.is_empty() || id.is_empty() {
                continue;
            }
            entries.entry(key).or_default().push(id);
        }
        Self { entries }
    }

    /// Returns the row IDs stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoLinkInput {
    #[serde(default)]
    pub client_id: String,
    /// Left table; its rows get the links.
    #[serde(default)]
    pub table_name: String,
    /// Right table; the link targets.
    #[serde(default)]
    pub other_table_name: String,
    #[serde(default)]
    pub link_id: String,
    #[serde(default)]
    pub left_key_column: String,
    #[serde(default)]
    pub right_key_column: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default = "default_max_rows")]
    pub max_left_rows: i64,
    #[serde(default = "default_max_rows")]
    pub max_right_rows: i64,
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_max_rows() -> i64 {
    DEFAULT_MAX_ROWS
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoLinkOutput {
    pub processed_left_rows: usize,
    pub matched_left_rows: usize,
    pub created_links: usize,
    pub skipped_rows: usize,
    pub mode: String,
}

struct LinkTarget {
    link_id: String,
    table_name: String,
    other_table_name: String,
}

async fn replace_links(
    ctx: &NodeContext<'_>,
    config: &seatable_client::ConnectionConfig,
    target: &LinkTarget,
    row_id: &str,
    other_ids: &[String],
) -> Result<(), NodeError> {
    let request = ApiRequest::new(HttpMethod::Put, endpoint::links_url(config), config.token())
        .with_body(json!({
            "link_id": target.link_id,
            "table_name": target.table_name,
            "other_table_name": target.other_table_name,
            "row_id": row_id,
            "other_rows_ids": other_ids,
        }));
    let response = ctx.http().execute(request).await?;
    if !response.is_success() {
        return Err(NodeError::Remote {
            operation: format!("update links for row {row_id}"),
            status: response.status,
            body: response.text(),
        });
    }
    Ok(())
}

fn clamp_rows(value: i64) -> i64 {
    if value <= 0 { DEFAULT_MAX_ROWS } else { value }
}

/// Joins the two tables and links every matched left row.
///
/// In dry-run mode the counters are computed the same way but no link
/// update is sent.
///
/// # Errors
///
/// Returns an error if the client is unknown, a required input is blank,
/// the mode is not `override`, either table cannot be fetched, or a link
/// update fails.
#[instrument(skip_all, fields(
    table = %input.table_name,
    other_table = %input.other_table_name,
    dry_run = input.dry_run,
))]
pub async fn run(ctx: &NodeContext<'_>, input: AutoLinkInput) -> Result<AutoLinkOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;

    const REQUIRED: &str = "Table, Other Table, Link ID and key columns are required";
    let target = LinkTarget {
        table_name: required(&input.table_name, REQUIRED)?,
        other_table_name: required(&input.other_table_name, REQUIRED)?,
        link_id: required(&input.link_id, REQUIRED)?,
    };
    let left_key = required(&input.left_key_column, REQUIRED)?;
    let right_key = required(&input.right_key_column, REQUIRED)?;

    let mode = input.mode.trim();
    if !mode.is_empty() && mode != MODE_OVERRIDE {
        return Err(NodeError::invalid(format!("Unsupported mode: {mode}")));
    }

    let right_rows = fetch_rows_for_key(
        ctx.http(),
        &config,
        &target.other_table_name,
        &right_key,
        clamp_rows(input.max_right_rows),
    )
    .await
    .map_err(|e| NodeError::from_api("fetch right rows", e))?;
    let index = KeyIndex::build(&right_rows, &right_key);
    debug!(rows = right_rows.len(), keys = index.len(), "indexed right table");

    let left_rows = fetch_rows_for_key(
        ctx.http(),
        &config,
        &target.table_name,
        &left_key,
        clamp_rows(input.max_left_rows),
    )
    .await
    .map_err(|e| NodeError::from_api("fetch left rows", e))?;

    let mut output = AutoLinkOutput {
        mode: MODE_OVERRIDE.to_string(),
        ..AutoLinkOutput::default()
    };
    for row in &left_rows {
        output.processed_left_rows += 1;

        let row_id = row_string(row, ROW_ID_COLUMN);
        let key = row_string(row, &left_key);
        let matches = match index.get(&key) {
            Some(ids) if !row_id.is_empty() && !key.is_empty() => ids,
            _ => {
                output.skipped_rows += 1;
                continue;
            }
        };

        output.matched_left_rows += 1;
        if !input.dry_run {
            replace_links(ctx, &config, &target, &row_id, matches).await?;
        }
        output.created_links += matches.len();
    }

    info!(
        processed = output.processed_left_rows,
        matched = output.matched_left_rows,
        created = output.created_links,
        skipped = output.skipped_rows,
        "auto link finished"
    );
    Ok(output)
}
