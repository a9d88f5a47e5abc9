//! Core types and utilities shared by the SeaTable nodes.
//!
//! This crate provides the `Result` alias used at the outer layers and the
//! strongly-typed client identifier handed out by the connect node.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::ClientId;
