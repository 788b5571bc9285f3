//! sigsmith-core
//!
//! Core library for turning a corpus of files into signature rules.
//!
//! This crate defines the data model, the string-corpus analysis engine
//! (aggregation, goodware filtering, scoring, selection, overlap
//! clustering), rule construction and rendering, the goodware store, and
//! the scanning glue that feeds the engine.
//!
//! All substantive logic lives here so it is fully testable and reusable
//! from multiple frontends.

pub mod model;
pub mod analysis;
pub mod rules;
pub mod db;
pub mod config;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
