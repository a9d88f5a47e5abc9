//! Report-based `Result` for the outer layers.
//!
//! Library crates return their own error enums. The runner lifts those into
//! `rootcause` reports with `?`, typed by the enum of the layer that failed.

use rootcause::Report;

/// `Result` whose error is a report with context type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
