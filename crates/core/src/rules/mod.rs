//! Rule construction and rendering.
//!
//! `RuleBuilder` turns a selected file or super-cluster into an immutable
//! `Rule` (name, metadata, hashes, strings); `writer` renders rules into
//! signature text.

pub mod writer;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::model::{FileRecord, Rule, RuleKind, RuleMeta, StringKey};

pub use writer::{
    escape_string, render_entry, render_rule, truncate_entry, write_rules, EmitSummary,
    MAX_ENTRY_CHARS,
};

/// Errors raised while building or rendering a single rule.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A covered file has no record in the corpus, so its hash is unknown.
    #[error("No file record for {0}")]
    MissingFile(String),

    /// A rule would carry no string entries.
    #[error("Rule {0} has no strings")]
    EmptyRule(String),

    /// Writing rendered rules failed.
    #[error("Failed to write rules: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for rule emission.
pub type EmitResult<T> = Result<T, EmitError>;

/// Format a date the way rule metadata carries it.
pub fn format_rule_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Replace every character outside `[A-Za-z0-9_]` with `_` and prefix
/// names starting with a digit with `sig_`.
pub fn clean_rule_name(raw: &str) -> String {
    let prefixed = if raw.starts_with(|c: char| c.is_ascii_digit()) {
        format!("sig_{raw}")
    } else {
        raw.to_string()
    };
    prefixed.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
}

/// Base name for a single-file rule.
///
/// Short stems (under 8 characters) borrow the parent directory name.
pub fn simple_rule_base_name(path: &str) -> String {
    let path = Path::new(path);
    let stem = file_stem(path);
    let raw = if stem.chars().count() < 8 {
        match path.parent().and_then(|p| p.file_name()) {
            Some(dir) => format!("{}_{}", dir.to_string_lossy(), stem),
            None => stem,
        }
    } else {
        stem
    };
    clean_rule_name(&raw)
}

/// Base name for a super-rule: `_<stem>` for every covered file.
pub fn super_rule_base_name<S: AsRef<str>>(paths: &[S]) -> String {
    let raw: String =
        paths.iter().map(|p| format!("_{}", file_stem(Path::new(p.as_ref())))).collect();
    clean_rule_name(&raw)
}

/// Hands out unique rule names: `name`, then `name_2`, `name_3`, ...
///
/// Generated suffixes never repeat a name already handed out, including
/// a base name that happens to end in `_<n>`.
#[derive(Debug, Default)]
pub struct RuleNamer {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl RuleNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let next = self.next_suffix.entry(base.to_string()).or_insert(2);
        loop {
            let candidate = format!("{base}_{next}");
            *next += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Builds rules sharing one metadata block, date, and name registry.
#[derive(Debug)]
pub struct RuleBuilder {
    meta: RuleMeta,
    date: String,
    max_per_rule: usize,
    namer: RuleNamer,
}

impl RuleBuilder {
    /// Builder dated today (local time).
    pub fn new(meta: RuleMeta, max_per_rule: usize) -> Self {
        Self::with_date(meta, max_per_rule, Local::now().date_naive())
    }

    pub fn with_date(meta: RuleMeta, max_per_rule: usize, date: NaiveDate) -> Self {
        Self { meta, date: format_rule_date(date), max_per_rule, namer: RuleNamer::new() }
    }

    fn cap(&self, mut strings: Vec<StringKey>) -> Vec<StringKey> {
        strings.truncate(self.max_per_rule.saturating_add(1));
        strings
    }

    /// Rule for one file.
    pub fn simple_rule(&mut self, file: &FileRecord, strings: Vec<StringKey>) -> EmitResult<Rule> {
        let base = simple_rule_base_name(&file.path);
        if strings.is_empty() {
            return Err(EmitError::EmptyRule(base));
        }
        let file_name = Path::new(&file.path)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file.path.clone());
        Ok(Rule {
            name: self.namer.claim(&base),
            kind: RuleKind::Simple,
            description: format!("{} - file {}", self.meta.prefix, file_name),
            author: self.meta.author.clone(),
            reference: self.meta.reference.clone(),
            date: self.date.clone(),
            hashes: vec![file.hash.clone()],
            strings: self.cap(strings),
        })
    }

    /// Rule covering several files at once.
    pub fn super_rule(&mut self, files: &[&FileRecord], strings: Vec<StringKey>) -> EmitResult<Rule> {
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        let base = super_rule_base_name(&paths);
        if strings.is_empty() {
            return Err(EmitError::EmptyRule(base));
        }
        let listing = paths
            .iter()
            .map(|p| {
                Path::new(p).file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Rule {
            name: self.namer.claim(&base),
            kind: RuleKind::Super,
            description: format!("{} - from files {}", self.meta.prefix, listing),
            author: self.meta.author.clone(),
            reference: self.meta.reference.clone(),
            date: self.date.clone(),
            hashes: files.iter().map(|f| f.hash.clone()).collect(),
            strings: self.cap(strings),
        })
    }
}
