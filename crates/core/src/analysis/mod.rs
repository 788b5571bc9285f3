//! String-corpus analysis engine.
//!
//! Stages, in pipeline order:
//! - `corpus`: aggregate extracted strings into per-string statistics.
//! - `goodware`: drop strings known from benign files.
//! - `scoring` / `randomness`: rank strings by heuristic relevance.
//! - `select`: keep the top-ranked strings per rule.
//! - `cluster`: promote strings shared by several files to super-rules.

pub mod cluster;
pub mod corpus;
pub mod goodware;
pub mod randomness;
pub mod scoring;
pub mod select;

pub use cluster::{
    build_clusters, promote_clusters, Cluster, ClusterOutcome, ClusterSettings, FileSet,
    SimplePool,
};
pub use corpus::{aggregate, AddOutcome, Aggregator, Corpus};
pub use goodware::{filter_goodware, GoodwareSet};
pub use randomness::{EntropyDetector, FixedDetector, RandomnessDetector};
pub use scoring::{LengthBounds, Scorer, SuspiciousList};
pub use select::{select_strings, select_top};
