use anyhow::{Context, Result};
use sigsmith_core::db::{open_goodware_db, GoodwareDb, MergeStats, StoreMode};
use sigsmith_core::services::{build_goodware_store, ScanOptions};

use crate::absolutize;
use crate::commands::resolve_dirs;

/// Scan options shared by the goodware subcommands.
#[derive(Debug, Clone, Default)]
pub struct GoodwareScanArgs {
    pub dirs: Vec<String>,
    pub db: String,
    pub recursive: bool,
    pub only_executables: bool,
    pub max_file_size: Option<u64>,
}

impl GoodwareScanArgs {
    fn scan_options(&self) -> ScanOptions {
        let defaults = ScanOptions::default();
        ScanOptions {
            recursive: self.recursive,
            executables_only: self.only_executables,
            max_file_size: self.max_file_size.unwrap_or(defaults.max_file_size),
        }
    }
}

/// Build a fresh goodware database, discarding any previous one.
pub fn goodware_create_command(args: &GoodwareScanArgs) -> Result<MergeStats> {
    let db_path = absolutize(&args.db)?;
    let roots = resolve_dirs(&args.dirs)?;

    println!("Processing goodware files ...");
    println!("Creating local database ...");
    let (stats, _scan) =
        build_goodware_store(&roots, &args.scan_options(), &db_path, StoreMode::Create)
            .with_context(|| format!("Failed to create goodware database {}", db_path.display()))?;
    println!("New database with {} entries created.", stats.strings);
    Ok(stats)
}

/// Merge newly scanned goodware strings into an existing database.
pub fn goodware_update_command(args: &GoodwareScanArgs) -> Result<MergeStats> {
    let db_path = absolutize(&args.db)?;
    let roots = resolve_dirs(&args.dirs)?;

    println!("Processing goodware files ...");
    println!("Updating local database ...");
    let old_entries = if db_path.is_file() {
        open_goodware_db(&db_path)?.strings_len().context("Failed to count database entries")?
    } else {
        0
    };
    println!("Old database entries: {}", old_entries);

    let (stats, _scan) =
        build_goodware_store(&roots, &args.scan_options(), &db_path, StoreMode::Update)
            .with_context(|| format!("Failed to update goodware database {}", db_path.display()))?;

    let db = GoodwareDb::open(&db_path)
        .with_context(|| format!("Failed to reopen goodware database {}", db_path.display()))?;
    println!("New database entries: {}", db.strings_len()?);
    Ok(stats)
}

/// Print entry counts and write history for a goodware database.
pub fn goodware_info_command(db: &str, json: bool) -> Result<()> {
    let db_path = absolutize(db)?;
    let db = open_goodware_db(&db_path)?;
    let strings = db.strings_len().context("Failed to count strings")?;
    let files = db.files_len().context("Failed to count files")?;
    let runs = db.list_store_runs().context("Failed to list store runs")?;

    if json {
        let payload = serde_json::json!({
            "db": db_path.display().to_string(),
            "strings": strings,
            "files": files,
            "runs": runs,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Goodware database: {}", db_path.display());
        println!("  Strings: {}", strings);
        println!("  Files: {}", files);
        println!("  Runs ({}):", runs.len());
        if runs.is_empty() {
            println!("    (none)");
        }
        for run in runs {
            println!(
                "    - {} at {}: {} strings, {} files",
                run.mode.as_str(),
                run.finished_at,
                run.strings_written,
                run.files_written
            );
        }
    }
    Ok(())
}
