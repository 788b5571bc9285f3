use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::model::{ExtractedFile, FileRecord, StringKey, StringRecord};

/// Per-string and per-file statistics for one scan.
///
/// Built by an `Aggregator`, then handed read-only to filtering, scoring
/// and clustering. Iteration order is insertion order for both strings and
/// files, so every downstream stage is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    strings: Vec<StringRecord>,
    index: HashMap<StringKey, usize>,
    files: Vec<FileRecord>,
    file_index: HashMap<String, usize>,
}

impl Corpus {
    /// Number of distinct strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn get(&self, key: &StringKey) -> Option<&StringRecord> {
        self.index.get(key).map(|&i| &self.strings[i])
    }

    pub fn contains(&self, key: &StringKey) -> bool {
        self.index.contains_key(key)
    }

    /// All string records in insertion order.
    pub fn strings(&self) -> &[StringRecord] {
        &self.strings
    }

    /// All file records in insertion order.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.file_index.get(path).map(|&i| &self.files[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &StringKey> {
        self.strings.iter().map(|r| &r.key)
    }

    /// Rebuild the corpus keeping only strings accepted by `keep`.
    ///
    /// File records are kept as-is; a file whose strings were all removed
    /// still carries its hash for rule metadata.
    pub fn retain_strings<F>(self, mut keep: F) -> Corpus
    where
        F: FnMut(&StringRecord) -> bool,
    {
        let mut out = Corpus { files: self.files, file_index: self.file_index, ..Corpus::default() };
        for record in self.strings {
            if keep(&record) {
                out.index.insert(record.key.clone(), out.strings.len());
                out.strings.push(record);
            }
        }
        out
    }
}

/// Result of handing one file to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The file's strings were counted.
    Added,
    /// A file with the same content hash was already aggregated.
    DuplicateHash,
}

/// Builds a `Corpus` from extracted files, skipping duplicate content.
#[derive(Debug, Default)]
pub struct Aggregator {
    corpus: Corpus,
    seen_hashes: HashSet<String>,
    duplicates: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every distinct string of `file` once against that file.
    ///
    /// A file whose content hash was already seen contributes nothing.
    pub fn add(&mut self, file: ExtractedFile) -> AddOutcome {
        let ExtractedFile { record, strings } = file;

        if !self.seen_hashes.insert(record.hash.clone()) {
            debug!(path = %record.path, hash = %record.hash, "skipping duplicate content");
            self.duplicates += 1;
            return AddOutcome::DuplicateHash;
        }

        let corpus = &mut self.corpus;
        let mut in_file: HashSet<&StringKey> = HashSet::new();
        for key in &strings {
            if !in_file.insert(key) {
                continue;
            }
            let idx = match corpus.index.get(key) {
                Some(&i) => i,
                None => {
                    corpus.index.insert(key.clone(), corpus.strings.len());
                    corpus.strings.push(StringRecord::new(key.clone()));
                    corpus.strings.len() - 1
                }
            };
            let entry = &mut corpus.strings[idx];
            entry.file_count += 1;
            entry.files.push(record.path.clone());
        }

        debug!(
            path = %record.path,
            size = record.size,
            file_strings = in_file.len(),
            total_strings = corpus.strings.len(),
            "aggregated file"
        );

        if let Some(&i) = corpus.file_index.get(&record.path) {
            corpus.files[i] = record;
        } else {
            corpus.file_index.insert(record.path.clone(), corpus.files.len());
            corpus.files.push(record);
        }

        AddOutcome::Added
    }

    /// Number of files skipped because their content was already seen.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Peek at the corpus under construction.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Finish aggregation and hand out the corpus.
    pub fn finish(self) -> Corpus {
        info!(
            files = self.corpus.files.len(),
            strings = self.corpus.strings.len(),
            duplicates = self.duplicates,
            "corpus aggregated"
        );
        self.corpus
    }
}

/// Aggregate a sequence of extracted files in one go.
pub fn aggregate<I>(files: I) -> Corpus
where
    I: IntoIterator<Item = ExtractedFile>,
{
    let mut aggregator = Aggregator::new();
    for file in files {
        aggregator.add(file);
    }
    aggregator.finish()
}
