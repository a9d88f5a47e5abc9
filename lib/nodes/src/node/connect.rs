//! Connect: validates connection settings and registers a client.

use crate::context::{NodeContext, required};
use crate::error::NodeError;
use seatable_client::ConnectionConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInput {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub base_uuid: String,
    /// Credential item; the token is its `value` field.
    #[serde(default)]
    pub base_token: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutput {
    pub client_id: String,
}

fn token_from_item(item: Option<&JsonValue>) -> Result<String, NodeError> {
    let item = match item {
        None | Some(JsonValue::Null) => return Err(NodeError::invalid("Base Token is required")),
        Some(item) => item,
    };
    let Some(value) = item.as_object().and_then(|map| map.get("value")) else {
        return Err(NodeError::invalid("Vault item missing 'value'"));
    };
    match value.as_str() {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(NodeError::invalid("Invalid Base Token value")),
    }
}

/// Registers the connection and returns its client ID.
///
/// # Errors
///
/// Returns an invalid-argument error if the server URL or base UUID is
/// blank, or the token item is missing or malformed.
#[instrument(skip_all)]
pub fn run(ctx: &NodeContext<'_>, input: ConnectInput) -> Result<ConnectOutput, NodeError> {
    let server = required(input.server_url.trim().trim_end_matches('/'), "Server URL is required")?;
    let base_uuid = required(&input.base_uuid, "Base UUID is required")?;
    let token = token_from_item(input.base_token.as_ref())?;

    let client_id = ctx
        .registry()
        .register(ConnectionConfig::new(server, base_uuid, token));
    info!(client_id = %client_id, "connected");
    Ok(ConnectOutput {
        client_id: client_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client::{ClientRegistry, MockExecutor};
    use seatable_core::ClientId;
    use serde_json::json;

    fn input(token: Option<JsonValue>) -> ConnectInput {
        ConnectInput {
            server_url: "https://cloud.seatable.io/".to_string(),
            base_uuid: " 5f3c-aa ".to_string(),
            base_token: token,
        }
    }

    #[test]
    fn connect_registers_normalized_config() {
        let registry = ClientRegistry::new();
        let http = MockExecutor::new();
        let ctx = NodeContext::new(&registry, &http);

        let output = run(&ctx, input(Some(json!({"value": "tok"})))).expect("connect");

        let config = registry
            .lookup(&ClientId::from(output.client_id.as_str()))
            .expect("registered");
        assert_eq!(config.server(), "https://cloud.seatable.io");
        assert_eq!(config.base_uuid(), "5f3c-aa");
        assert_eq!(config.token(), "tok");
        assert_eq!(http.call_count(), 0);
    }

    #[test]
    fn connect_validates_inputs_in_order() {
        let registry = ClientRegistry::new();
        let http = MockExecutor::new();
        let ctx = NodeContext::new(&registry, &http);

        let mut missing_server = input(Some(json!({"value": "tok"})));
        missing_server.server_url = " / ".to_string();
        let err = run(&ctx, missing_server).unwrap_err();
        assert!(err.to_string().contains("Server URL is required"));

        let mut missing_base = input(Some(json!({"value": "tok"})));
        missing_base.base_uuid = String::new();
        let err = run(&ctx, missing_base).unwrap_err();
        assert!(err.to_string().contains("Base UUID is required"));

        assert!(registry.is_empty());
    }

    #[test]
    fn token_item_shapes() {
        assert!(
            token_from_item(None)
                .unwrap_err()
                .to_string()
                .contains("Base Token is required")
        );
        assert!(
            token_from_item(Some(&json!({"secret": "x"})))
                .unwrap_err()
                .to_string()
                .contains("missing 'value'")
        );
        assert!(
            token_from_item(Some(&json!({"value": "  "})))
                .unwrap_err()
                .to_string()
                .contains("Invalid Base Token value")
        );
        assert!(token_from_item(Some(&json!({"value": 42}))).is_err());
        assert_eq!(token_from_item(Some(&json!({"value": "t"}))).expect("token"), "t");
    }
}
