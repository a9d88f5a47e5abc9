//! SeaTable workflow nodes.
//!
//! This crate provides:
//!
//! - **Connector trait**: common interface for named operations
//! - **Nodes**: one module per operation under [`node`]
//! - **SeaTable connector**: dispatches operation names to the nodes and
//!   records latency and API call counts

pub mod connector;
pub mod context;
pub mod error;
pub mod node;
pub mod seatable;

pub use connector::{
    Connector, ConnectorCapability, ConnectorInfo, Operation, OperationInfo, OperationMetadata,
    OperationResult,
};
pub use context::{CountingExecutor, NodeContext, ResponseOutput};
pub use error::NodeError;
pub use seatable::{OperationKind, SeaTableConnector};
