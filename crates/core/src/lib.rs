//! facts-core
//!
//! Core library for ingesting dynamic-analysis sandbox reports and exchanging
//! extracted features between analysis stages.
//!
//! - `value`: integer and byte-buffer normalization for external data.
//! - `report`: typed, validated view of a sandbox execution report.
//! - `features`: the closed set of feature kinds and their wire codec.
//! - `store`: a SQLite archive of frozen features per sample.
//!
//! The CLI is a thin shell over this crate; all substantive logic lives here
//! so it is testable without a process boundary.

pub mod features;
pub mod report;
pub mod store;
pub mod value;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
