//! The SeaTable nodes.
//!
//! Each node takes a camelCase input struct, runs against a
//! [`NodeContext`](crate::NodeContext) and returns a camelCase output struct.

pub mod auto_link;
pub mod connect;
pub mod download_file;
pub mod get_row;
pub mod link;
pub mod metadata;
pub mod rows;
pub mod rows_get_many;
pub mod search;
pub mod sql_query;
pub mod upload_attachment;
