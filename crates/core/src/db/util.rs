use std::path::Path;

use anyhow::{Context, Result};

use crate::db::GoodwareDb;

/// Default file name for the goodware store.
pub const DEFAULT_DB_FILE: &str = "good_strings.db";

/// Open an existing goodware store, attaching the path to any error.
pub fn open_goodware_db(path: &Path) -> Result<GoodwareDb> {
    GoodwareDb::open_existing(path)
        .with_context(|| format!("Failed to open goodware database at {}", path.display()))
}
