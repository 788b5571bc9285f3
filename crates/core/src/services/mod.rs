//! Glue around the analysis engine: file scanning, reference-list loading,
//! and the end-to-end generation pipeline.

pub mod extract;
pub mod generator;
pub mod suspicious;

pub use extract::*;
pub use generator::*;
pub use suspicious::*;
