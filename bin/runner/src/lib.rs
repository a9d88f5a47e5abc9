//! Command-line host for the SeaTable nodes.
//!
//! Connects with the configured credentials, runs one operation through
//! the connector and hands back its result.

pub mod config;
pub mod error;

use error::RunnerError;
use seatable_core::Result;
use seatable_nodes::{Connector, Operation, OperationResult};
use serde_json::{Value as JsonValue, json};
use tracing::{info, instrument};

pub use config::RunnerConfig;

/// Operation name and raw params taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: String,
    /// `None` means the params come from stdin.
    pub params: Option<String>,
}

impl Invocation {
    /// Parses `<operation> [params-json]`, skipping the program name.
    ///
    /// # Errors
    ///
    /// Returns a usage error when the operation is missing or extra
    /// arguments are given.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self, RunnerError> {
        let mut args = args.into_iter().skip(1);
        let operation = args
            .next()
            .filter(|op| !op.trim().is_empty())
            .ok_or_else(|| RunnerError::Usage {
                details: "seatable-runner <operation> [params-json]".to_string(),
            })?;
        let params = args.next();
        if args.next().is_some() {
            return Err(RunnerError::Usage {
                details: "too many arguments".to_string(),
            }
            .into());
        }
        Ok(Self { operation, params })
    }
}

/// Parses a params document. Blank input is an empty object.
///
/// # Errors
///
/// Returns an error if the input is not a JSON object.
pub fn parse_params(raw: &str) -> Result<JsonValue, RunnerError> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    let value: JsonValue = serde_json::from_str(raw).map_err(|e| RunnerError::InvalidParams {
        details: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(RunnerError::InvalidParams {
            details: "params must be a JSON object".to_string(),
        }
        .into());
    }
    Ok(value)
}

/// Sets `clientId` unless the params already carry a non-blank one.
pub fn with_client_id(mut params: JsonValue, client_id: &str) -> JsonValue {
    if let Some(map) = params.as_object_mut() {
        let present = map
            .get("clientId")
            .and_then(JsonValue::as_str)
            .is_some_and(|id| !id.trim().is_empty());
        if !present {
            map.insert("clientId".to_string(), json!(client_id));
        }
    }
    params
}

/// Connects with `config`, then runs `operation` with `params`.
///
/// A `connect` operation returns the connect result itself.
///
/// # Errors
///
/// Returns an error if connecting fails or the connector rejects the
/// operation. A node failure is an unsuccessful `OperationResult`, not an
/// error.
#[instrument(skip(connector, config, params))]
pub async fn run(
    connector: &dyn Connector,
    config: &RunnerConfig,
    operation: &str,
    params: JsonValue,
) -> Result<OperationResult, RunnerError> {
    let connect = Operation::new("connect").with_parameters(json!({
        "serverUrl": config.server_url,
        "baseUuid": config.base_uuid,
        "baseToken": {"value": config.base_token},
    }));
    let connected = connector
        .execute(connect)
        .await
        .map_err(|e| RunnerError::ConnectFailed {
            details: e.to_string(),
        })?;
    if operation == "connect" {
        return Ok(connected);
    }

    let client_id = connected
        .data
        .as_ref()
        .filter(|_| connected.success)
        .and_then(|data| data.get("clientId"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| RunnerError::ConnectFailed {
            details: connected
                .error
                .clone()
                .unwrap_or_else(|| "no client ID returned".to_string()),
        })?;
    info!(client_id = %client_id, "connected");

    let params = with_client_id(params, &client_id);
    let result = connector
        .execute(Operation::new(operation).with_parameters(params))
        .await
        .map_err(|e| RunnerError::OperationRejected {
            operation: operation.to_string(),
            details: e.to_string(),
        })?;
    info!(
        success = result.success,
        latency_ms = result.metadata.latency_ms,
        api_calls = result.metadata.api_calls,
        "operation finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client::{ClientRegistry, HttpConfig, MockExecutor};
    use seatable_nodes::SeaTableConnector;
    use std::sync::Arc;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn config(token: &str) -> RunnerConfig {
        RunnerConfig {
            server_url: "https://cloud.seatable.io".to_string(),
            base_uuid: "b1".to_string(),
            base_token: token.to_string(),
            http: HttpConfig::default(),
        }
    }

    fn connector(http: MockExecutor) -> SeaTableConnector {
        SeaTableConnector::new(Arc::new(ClientRegistry::new()), Arc::new(http))
    }

    #[test]
    fn invocation_parsing() {
        let inv = Invocation::from_args(args(&["runner", "get_metadata"])).expect("args");
        assert_eq!(inv.operation, "get_metadata");
        assert_eq!(inv.params, None);

        let inv = Invocation::from_args(args(&["runner", "sql_query", r#"{"sql":"SELECT 1"}"#]))
            .expect("args");
        assert_eq!(inv.params.as_deref(), Some(r#"{"sql":"SELECT 1"}"#));

        assert!(Invocation::from_args(args(&["runner"])).is_err());
        assert!(Invocation::from_args(args(&["runner", "a", "{}", "extra"])).is_err());
    }

    #[test]
    fn params_must_be_an_object() {
        assert_eq!(parse_params("  ").expect("blank"), json!({}));
        assert_eq!(parse_params(r#"{"a":1}"#).expect("object"), json!({"a": 1}));
        assert!(parse_params("[1,2]").is_err());
        assert!(parse_params("{nope").is_err());
    }

    #[test]
    fn client_id_is_injected_only_when_missing() {
        assert_eq!(
            with_client_id(json!({"tableName": "T"}), "st_1"),
            json!({"tableName": "T", "clientId": "st_1"})
        );
        assert_eq!(
            with_client_id(json!({"clientId": "st_mine"}), "st_1"),
            json!({"clientId": "st_mine"})
        );
        assert_eq!(
            with_client_id(json!({"clientId": " "}), "st_1"),
            json!({"clientId": "st_1"})
        );
    }

    #[tokio::test]
    async fn runs_operation_with_injected_client() {
        let connector = connector(
            MockExecutor::new().with_json(200, json!({"views": [{"name": "Default View"}]})),
        );

        let result = run(
            &connector,
            &config("tok"),
            "list_views",
            json!({"tableName": "Orders"}),
        )
        .await
        .expect("run");

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.data.expect("data")["count"], 1);
        assert_eq!(connector.registry().len(), 1);
    }

    #[tokio::test]
    async fn blank_token_fails_to_connect() {
        let connector = connector(MockExecutor::new());
        let err = run(&connector, &config(" "), "get_metadata", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid Base Token value"));
    }

    #[tokio::test]
    async fn unknown_operation_is_rejected() {
        let connector = connector(MockExecutor::new());
        let err = run(&connector, &config("tok"), "drop_base", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("operation 'drop_base' rejected"));
    }
}
