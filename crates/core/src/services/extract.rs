use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::bytes::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analysis::corpus::{AddOutcome, Aggregator};
use crate::model::{ExtractedFile, FileRecord, StringKey};

/// Extensions accepted in executables-only mode (compared case-insensitively).
pub const EXECUTABLE_EXTENSIONS: &[&str] =
    &["exe", "dll", "cmd", "asp", "php", "jsp", "bin", "infected"];

/// Minimum run length, in characters, for an extracted string.
pub const MIN_RUN_LEN: usize = 6;

static ASCII_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!(r"(?-u)[\x1f-\x7e]{{{MIN_RUN_LEN},}}")).ok());

static WIDE_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!(r"(?-u)(?:[\x1f-\x7e]\x00){{{MIN_RUN_LEN},}}")).ok());

/// Errors raised while walking or reading scan inputs.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Scan root does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Which files a directory scan considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub recursive: bool,
    pub executables_only: bool,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { recursive: false, executables_only: false, max_file_size: 2_000_000 }
    }
}

/// Counters for one directory scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanStats {
    pub added: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Whether `path` carries one of `EXECUTABLE_EXTENSIONS`.
pub fn has_executable_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| EXECUTABLE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Pull ascii and UTF-16LE printable runs out of raw bytes.
///
/// Each distinct string appears once, ascii runs first, in first-seen order.
pub fn extract_strings(data: &[u8]) -> Vec<StringKey> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    if let Some(re) = ASCII_RUN.as_ref() {
        for m in re.find_iter(data) {
            let key = StringKey::ascii(String::from_utf8_lossy(m.as_bytes()));
            if seen.insert(key.clone()) {
                out.push(key);
            }
        }
    }

    if let Some(re) = WIDE_RUN.as_ref() {
        for m in re.find_iter(data) {
            let text: String = m.as_bytes().iter().step_by(2).map(|&b| b as char).collect();
            let key = StringKey::wide(text);
            if seen.insert(key.clone()) {
                out.push(key);
            }
        }
    }

    out
}

/// Read one file, hash it, and extract its strings.
pub fn extract_file(path: &Path) -> ExtractResult<ExtractedFile> {
    let data =
        fs::read(path).map_err(|source| ExtractError::Io { path: path.to_path_buf(), source })?;
    let record = FileRecord::new(path.display().to_string(), sha256_hex(&data), data.len() as u64);
    Ok(ExtractedFile { record, strings: extract_strings(&data) })
}

/// List the files under `root` that pass the extension filter, sorted by name.
///
/// Size filtering happens in `scan_directory`, where metadata is at hand.
pub fn collect_files(root: &Path, options: &ScanOptions) -> ExtractResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(ExtractError::MissingRoot(root.to_path_buf()));
    }
    let mut walker = WalkDir::new(root).min_depth(1).follow_links(false).sort_by_file_name();
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if options.executables_only && !has_executable_extension(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Scan `root` and feed every eligible file into `aggregator`.
///
/// Oversized and unreadable files are skipped; only a missing root fails.
pub fn scan_directory(
    root: &Path,
    options: &ScanOptions,
    aggregator: &mut Aggregator,
) -> ExtractResult<ScanStats> {
    let mut stats = ScanStats::default();
    for path in collect_files(root, options)? {
        match fs::metadata(&path) {
            Ok(meta) if meta.len() > options.max_file_size => {
                debug!(path = %path.display(), size = meta.len(), "skipping oversized file");
                stats.skipped += 1;
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat file");
                stats.failed += 1;
                continue;
            }
        }

        let extracted = match extract_file(&path) {
            Ok(extracted) => extracted,
            Err(err) => {
                warn!(error = %err, "skipping file");
                stats.failed += 1;
                continue;
            }
        };

        match aggregator.add(extracted) {
            AddOutcome::Added => stats.added += 1,
            AddOutcome::DuplicateHash => {
                info!(path = %path.display(), "skipping strings due to duplicate content");
                stats.duplicates += 1;
            }
        }
    }
    Ok(stats)
}
