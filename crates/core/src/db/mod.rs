//! Goodware store integration.
//!
//! This module wraps a SQLite database holding strings observed in benign
//! files:
//! - `GoodwareDb`: a small SQLite wrapper with versioned schema.
//! - `StoreMode` / `StoreRunRecord`: bookkeeping for create/update runs.
//! - `open_goodware_db`: context-rich helper for frontends.

pub mod goodware_db;
pub mod util;

pub use goodware_db::*;
pub use util::*;
