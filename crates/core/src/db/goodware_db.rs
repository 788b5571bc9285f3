use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::analysis::corpus::Corpus;
use crate::analysis::goodware::GoodwareSet;
use crate::model::{Encoding, FileRecord, StringKey};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for goodware store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// A store was required but does not exist.
    #[error("Goodware database not found at {0}")]
    Missing(PathBuf),

    /// Removing a previous store file failed.
    #[error("Failed to remove existing database {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// How a store was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    Create,
    Update,
}

impl StoreMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreMode::Create => "create",
            StoreMode::Update => "update",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "create" => StoreMode::Create,
            _ => StoreMode::Update,
        }
    }
}

/// Bookkeeping row written for every create/update.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoreRunRecord {
    pub mode: StoreMode,
    pub strings_written: i64,
    pub files_written: i64,
    pub finished_at: String,
}

/// Counts written by one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MergeStats {
    pub strings: usize,
    pub files: usize,
}

/// SQLite-backed store of strings seen in benign files.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Merging corpora and loading the reference set back.
#[derive(Debug)]
pub struct GoodwareDb {
    conn: Connection,
}

impl GoodwareDb {
    /// Open (or create) a store at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open a store that must already exist.
    pub fn open_existing(path: &Path) -> StoreResult<Self> {
        if !path.is_file() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        Self::open(path)
    }

    /// Discard any store at `path` and start an empty one.
    pub fn create(path: &Path) -> StoreResult<Self> {
        if path.exists() {
            std::fs::remove_file(path)
                .map_err(|source| StoreError::Remove { path: path.to_path_buf(), source })?;
        }
        Self::open(path)
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Upsert every string and file of `corpus`; later writes win on collision.
    pub fn merge_corpus(&self, corpus: &Corpus, mode: StoreMode) -> StoreResult<MergeStats> {
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO good_strings (content, encoding, count)
                VALUES (?1, ?2, ?3)
                "#,
            )?;
            for record in corpus.strings() {
                stmt.execute(params![
                    record.key.text,
                    record.key.encoding.as_str(),
                    record.file_count as i64
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO good_files (path, hash, size)
                VALUES (?1, ?2, ?3)
                "#,
            )?;
            for file in corpus.files() {
                stmt.execute(params![file.path, file.hash, file.size as i64])?;
            }
        }

        let stats = MergeStats { strings: corpus.len(), files: corpus.files().len() };
        tx.execute(
            r#"
            INSERT INTO store_runs (mode, strings_written, files_written, finished_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![mode.as_str(), stats.strings as i64, stats.files as i64, Utc::now().to_rfc3339()],
        )?;

        tx.commit()?;
        Ok(stats)
    }

    /// Load every stored string key as a reference set.
    pub fn load_goodware_set(&self) -> StoreResult<GoodwareSet> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT content, encoding
            FROM good_strings
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let encoding: String = row.get(1)?;
            Ok(StringKey::new(row.get::<_, String>(0)?, Encoding::from_tag(&encoding)))
        })?;

        let mut out = GoodwareSet::new();
        for row in rows {
            out.insert(row?);
        }
        Ok(out)
    }

    /// Stored count for one string, if present.
    pub fn string_count(&self, key: &StringKey) -> StoreResult<Option<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT count FROM good_strings
            WHERE content = ?1 AND encoding = ?2
            "#,
        )?;
        let mut rows = stmt.query(params![key.text, key.encoding.as_str()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// Number of stored strings.
    pub fn strings_len(&self) -> StoreResult<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM good_strings", [], |row| row.get(0))?)
    }

    /// Number of stored files.
    pub fn files_len(&self) -> StoreResult<i64> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM good_files", [], |row| row.get(0))?)
    }

    /// List stored files (ordered by path).
    pub fn list_files(&self) -> StoreResult<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT path, hash, size
            FROM good_files
            ORDER BY path
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FileRecord {
                path: row.get(0)?,
                hash: row.get(1)?,
                size: row.get::<_, i64>(2)? as u64,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// List create/update runs (oldest first).
    pub fn list_store_runs(&self) -> StoreResult<Vec<StoreRunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT mode, strings_written, files_written, finished_at
            FROM store_runs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let mode: String = row.get(0)?;
            Ok(StoreRunRecord {
                mode: StoreMode::from_str_lossy(&mode),
                strings_written: row.get(1)?,
                files_written: row.get(2)?,
                finished_at: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: good_strings and good_files
/// - 2: add store_runs table
fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS good_strings (
                content  TEXT NOT NULL,
                encoding TEXT NOT NULL,
                count    INTEGER NOT NULL,
                PRIMARY KEY (content, encoding)
            );

            CREATE TABLE IF NOT EXISTS good_files (
                path TEXT PRIMARY KEY,
                hash TEXT NOT NULL,
                size INTEGER NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS store_runs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                mode            TEXT NOT NULL,
                strings_written INTEGER NOT NULL,
                files_written   INTEGER NOT NULL,
                finished_at     TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> StoreResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
