//! The surface hosts use to drive the nodes by name.
//!
//! Hosts send an [`Operation`] (a name plus JSON parameters) and receive an
//! [`OperationResult`]. They never see node input or output types.

use crate::error::NodeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::time::Instant;

/// What a connector offers, for listing in a host UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub operations: Vec<OperationInfo>,
}

impl ConnectorInfo {
    /// Looks up an operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationInfo> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Every capability at least one operation needs, without duplicates.
    #[must_use]
    pub fn capabilities(&self) -> Vec<ConnectorCapability> {
        let mut capabilities: Vec<ConnectorCapability> = Vec::new();
        for op in &self.operations {
            if !capabilities.contains(&op.capability) {
                capabilities.push(op.capability);
            }
        }
        capabilities
    }
}

/// One named operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    pub name: String,
    pub description: String,
    /// Parameters that must be present and non-blank.
    pub required_inputs: Vec<String>,
    pub capability: ConnectorCapability,
}

/// Kind of access an operation needs on the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorCapability {
    /// Registers connection settings; no HTTP traffic.
    Connect,
    ReadRows,
    WriteRows,
    ManageLinks,
    /// Attachment upload and file download.
    TransferFiles,
    ReadSchema,
}

/// A request to run one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    /// JSON object with the node's camelCase inputs.
    pub parameters: JsonValue,
}

impl Operation {
    /// Creates an operation with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: JsonValue::Object(Map::new()),
        }
    }

    /// Sets one parameter. Ignored when the parameters are not an object.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        if let Some(map) = self.parameters.as_object_mut() {
            map.insert(key.into(), value);
        }
        self
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_parameters(self, parameters: JsonValue) -> Self {
        Self { parameters, ..self }
    }
}

/// Outcome of running an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    /// Node output; set on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    /// Error message; set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: OperationMetadata,
}

/// Timing and traffic of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetadata {
    pub latency_ms: u64,
    /// HTTP calls made, including ones that failed.
    pub api_calls: u32,
    pub finished_at: DateTime<Utc>,
}

impl OperationMetadata {
    /// Metadata for a run that started at `started` and finished now.
    #[must_use]
    pub fn since(started: Instant, api_calls: u32) -> Self {
        Self {
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            api_calls,
            finished_at: Utc::now(),
        }
    }
}

impl OperationResult {
    #[must_use]
    pub fn success(data: JsonValue, metadata: OperationMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata,
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>, metadata: OperationMetadata) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata,
        }
    }
}

/// Runs named operations.
#[async_trait]
pub trait Connector: Send + Sync {
    fn info(&self) -> ConnectorInfo;

    /// Runs `operation`.
    ///
    /// A node that runs and fails yields a failed `OperationResult`, so the
    /// metadata of the attempt is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation name is not known.
    async fn execute(&self, operation: Operation) -> Result<OperationResult, NodeError>;

    /// Returns true if an operation with this name exists.
    fn supports(&self, name: &str) -> bool {
        self.info().operation(name).is_some()
    }
}
