//! Client identifiers handed out by the connect node.
//!
//! A client ID is an opaque string. Freshly generated IDs embed the base
//! UUID (without dashes) and a ULID, so two connects to the same base in
//! the same millisecond still receive distinct IDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque identifier for a registered SeaTable connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Prefix used for generated IDs.
    pub const PREFIX: &'static str = "st";

    /// Generates a new ID for a connection to the given base.
    #[must_use]
    pub fn generate(base_uuid: &str) -> Self {
        let base: String = base_uuid.chars().filter(|c| *c != '-').collect();
        Self(format!("{}_{}_{}", Self::PREFIX, base, Ulid::new()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientId {
    fn from(value: String) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}
