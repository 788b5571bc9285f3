//! Core data model for extracted strings, scanned files, and emitted rules.
//!
//! Everything downstream of extraction speaks in these types:
//! - `StringKey`: the identity of a string (text + encoding).
//! - `StringRecord`: per-string occurrence statistics.
//! - `FileRecord`: per-file identity used for dedup and rule metadata.
//! - `ScoredString`: a string paired with its relevance score.
//! - `Rule`: the immutable unit handed to the rule writer.

use std::fmt;

/// How a string was encoded in the scanned file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Single-byte printable run, kept verbatim.
    Ascii,
    /// UTF-16LE printable run, decoded to text.
    Wide,
}

impl Encoding {
    /// Tag used in rule text and in the goodware store.
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Wide => "wide",
        }
    }

    /// Decode a stored tag. Unknown tags fall back to `Ascii`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "wide" => Encoding::Wide,
            _ => Encoding::Ascii,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a string across the corpus, the goodware set, and the store.
///
/// Equal text with different encodings are distinct keys.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct StringKey {
    pub text: String,
    pub encoding: Encoding,
}

impl StringKey {
    pub fn new(text: impl Into<String>, encoding: Encoding) -> Self {
        Self { text: text.into(), encoding }
    }

    pub fn ascii(text: impl Into<String>) -> Self {
        Self::new(text, Encoding::Ascii)
    }

    pub fn wide(text: impl Into<String>) -> Self {
        Self::new(text, Encoding::Wide)
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Occurrence statistics for one string.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StringRecord {
    pub key: StringKey,
    /// Number of distinct files containing the string.
    pub file_count: usize,
    /// Owning files in the order they were aggregated.
    pub files: Vec<String>,
}

impl StringRecord {
    pub fn new(key: StringKey) -> Self {
        Self { key, file_count: 0, files: Vec::new() }
    }
}

/// A scanned file that contributed strings to a corpus.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileRecord {
    pub path: String,
    /// Hex-encoded SHA-256 of the file content.
    pub hash: String,
    pub size: u64,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, hash: impl Into<String>, size: u64) -> Self {
        Self { path: path.into(), hash: hash.into(), size }
    }
}

/// A string paired with its relevance score.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredString {
    pub key: StringKey,
    pub score: f64,
}

/// Whether a rule covers a single file or a cluster of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Simple,
    Super,
}

/// Free-text metadata shared by every rule of a run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuleMeta {
    /// Prefix for the generated description line.
    pub prefix: String,
    pub author: String,
    pub reference: String,
}

impl Default for RuleMeta {
    fn default() -> Self {
        Self {
            prefix: "Auto-generated rule".to_string(),
            author: "sigsmith".to_string(),
            reference: "not set".to_string(),
        }
    }
}

/// Immutable output unit handed to the rule writer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub description: String,
    pub author: String,
    pub reference: String,
    /// Generation date, `YYYY/MM/DD`.
    pub date: String,
    /// One content hash per covered file, in file order.
    pub hashes: Vec<String>,
    pub strings: Vec<StringKey>,
}

impl Rule {
    /// Number of files this rule covers.
    pub fn file_count(&self) -> usize {
        self.hashes.len()
    }
}

/// Output of the extraction stage for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub record: FileRecord,
    /// Distinct strings in first-seen order.
    pub strings: Vec<StringKey>,
}
