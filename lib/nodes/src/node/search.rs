//! Search: keyword search over a set of columns via SQL.

use crate::context::{NodeContext, ResponseOutput, default_true, required};
use crate::error::NodeError;
use seatable_client::SqlQuery;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use tracing::{debug, instrument};

const DEFAULT_MAX_ROWS: i64 = 100;

/// How the keyword is compared with each column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Contains,
    Equals,
    StartsWith,
    EndsWith,
}

impl FromStr for MatchMode {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "contains" => Ok(Self::Contains),
            "equals" => Ok(Self::Equals),
            "startsWith" => Ok(Self::StartsWith),
            "endsWith" => Ok(Self::EndsWith),
            other => Err(NodeError::invalid(format!("Unsupported match mode: {other}"))),
        }
    }
}

/// One `WHERE` condition and its bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub clause: String,
    pub param: String,
}

/// Builds the condition comparing `column` with `keyword`.
#[must_use]
pub fn condition(column: &str, keyword: &str, mode: MatchMode, case_sensitive: bool) -> Condition {
    let (column, keyword) = if case_sensitive {
        (column.to_string(), keyword.to_string())
    } else {
        (format!("LOWER({column})"), keyword.to_lowercase())
    };
    let (operator, param) = match mode {
        MatchMode::Equals => ("=", keyword),
        MatchMode::StartsWith => ("LIKE", format!("{keyword}%")),
        MatchMode::EndsWith => ("LIKE", format!("%{keyword}")),
        MatchMode::Contains => ("LIKE", format!("%{keyword}%")),
    };
    Condition {
        clause: format!("{column} {operator} ?"),
        param,
    }
}

/// Splits a comma separated column list, dropping blanks.
#[must_use]
pub fn split_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the search statement: conditions joined with `OR`, bounded by
/// `max_rows`. Identifiers are interpolated as given.
#[must_use]
pub fn search_query(
    table_name: &str,
    columns: &[String],
    keyword: &str,
    mode: MatchMode,
    case_sensitive: bool,
    max_rows: i64,
) -> (String, Vec<String>) {
    let (clauses, params): (Vec<String>, Vec<String>) = columns
        .iter()
        .map(|column| {
            let Condition { clause, param } = condition(column, keyword, mode, case_sensitive);
            (clause, param)
        })
        .unzip();
    let sql = format!(
        "SELECT * FROM {table_name} WHERE {} LIMIT {max_rows}",
        clauses.join(" OR ")
    );
    (sql, params)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInput {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub table_name: String,
    /// Comma separated column names.
    #[serde(default)]
    pub columns: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub match_mode: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_max_rows")]
    pub max_rows: i64,
    #[serde(default = "default_true")]
    pub convert_keys: bool,
}

const fn default_max_rows() -> i64 {
    DEFAULT_MAX_ROWS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    #[serde(flatten)]
    pub response: ResponseOutput,
    /// The `results` list, or empty.
    pub rows: Vec<JsonValue>,
    pub count: usize,
}

/// Runs the search and returns the matching rows.
///
/// # Errors
///
/// Returns an error if the client is unknown, the table, columns or keyword
/// are blank, the match mode is not supported, or the call cannot be made.
#[instrument(skip_all, fields(table = %input.table_name))]
pub async fn run(ctx: &NodeContext<'_>, input: SearchInput) -> Result<SearchOutput, NodeError> {
    let config = ctx.client(&input.client_id)?;
    let table_name = required(&input.table_name, "Table Name is required")?;
    let columns = split_columns(&input.columns);
    if columns.is_empty() {
        return Err(NodeError::invalid("At least one column is required"));
    }
    let keyword = required(&input.keyword, "Keyword is required")?;
    let mode: MatchMode = input.match_mode.parse()?;
    let max_rows = if input.max_rows <= 0 {
        DEFAULT_MAX_ROWS
    } else {
        input.max_rows
    };

    let (sql, params) = search_query(
        &table_name,
        &columns,
        &keyword,
        mode,
        input.case_sensitive,
        max_rows,
    );
    let request = SqlQuery::new(sql, input.convert_keys)
        .with_params(params.into_iter().map(JsonValue::String).collect())
        .into_request(&config)
        .map_err(|e| NodeError::from_api("build search request", e))?;

    let response = ctx.http().execute(request).await?;
    let response = ResponseOutput::from(&response);
    let rows = response.list_field("results");
    debug!(status = response.status_code, rows = rows.len(), "search completed");
    Ok(SearchOutput {
        count: rows.len(),
        rows,
        response,
    })
}
