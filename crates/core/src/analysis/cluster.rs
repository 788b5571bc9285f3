//! Overlap clustering and the simple-rule candidate pool.
//!
//! Strings found verbatim in several files are grouped by their exact
//! covering file-set. Groups are then resolved largest first; a group that
//! still carries enough strings after ranking becomes a super-rule, and its
//! files leave the pool of single-file candidates.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::analysis::corpus::Corpus;
use crate::analysis::scoring::Scorer;
use crate::analysis::select::select_strings;
use crate::model::StringKey;

/// Canonical (sorted, deduplicated) set of file paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileSet(Vec<String>);

impl FileSet {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files: Vec<String> = files.into_iter().map(Into::into).collect();
        files.sort();
        files.dedup();
        Self(files)
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `:`-joined form, used in logs.
    pub fn joined(&self) -> String {
        self.0.join(":")
    }
}

/// Strings sharing one exact covering file-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub key: FileSet,
    /// Covered files in aggregation order.
    pub files: Vec<String>,
    pub strings: Vec<StringKey>,
}

impl Cluster {
    /// Number of strings in the cluster.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Group every string seen in more than one file by its covering file-set.
pub fn build_clusters(corpus: &Corpus) -> BTreeMap<FileSet, Cluster> {
    let mut clusters: BTreeMap<FileSet, Cluster> = BTreeMap::new();
    for record in corpus.strings() {
        if record.file_count <= 1 {
            continue;
        }
        let key = FileSet::new(record.files.iter().cloned());
        clusters
            .entry(key.clone())
            .or_insert_with(|| Cluster { key, files: record.files.clone(), strings: Vec::new() })
            .strings
            .push(record.key.clone());
    }
    debug!(clusters = clusters.len(), "built overlap clusters");
    clusters
}

/// Per-file candidate strings for simple rules, in file aggregation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplePool {
    entries: Vec<(String, Vec<StringKey>)>,
    index: HashMap<String, usize>,
}

impl SimplePool {
    /// Collect every string seen in fewer than `max_file_count` files under
    /// each of its owning files.
    pub fn from_corpus(corpus: &Corpus, max_file_count: usize) -> Self {
        let mut pool = SimplePool::default();
        for file in corpus.files() {
            pool.index.insert(file.path.clone(), pool.entries.len());
            pool.entries.push((file.path.clone(), Vec::new()));
        }
        for record in corpus.strings() {
            if record.file_count >= max_file_count {
                continue;
            }
            for path in &record.files {
                if let Some(&i) = pool.index.get(path) {
                    pool.entries[i].1.push(record.key.clone());
                }
            }
        }
        pool.entries.retain(|(_, strings)| !strings.is_empty());
        pool.reindex();
        pool
    }

    fn reindex(&mut self) {
        self.index =
            self.entries.iter().enumerate().map(|(i, (path, _))| (path.clone(), i)).collect();
    }

    /// Remove a file from the pool. Returns whether it was present.
    pub fn remove(&mut self, path: &str) -> bool {
        match self.index.get(path) {
            Some(&i) => {
                self.entries.remove(i);
                self.reindex();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&[StringKey]> {
        self.index.get(path).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StringKey])> {
        self.entries.iter().map(|(path, strings)| (path.as_str(), strings.as_slice()))
    }
}

/// Thresholds for super-rule promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterSettings {
    pub max_per_rule: usize,
    /// Minimum strings left after selection for a cluster to be accepted.
    pub min_super_strings: usize,
}

/// Accepted super-rule clusters plus the reduced simple-rule pool.
#[derive(Debug, Clone, Default)]
pub struct ClusterOutcome {
    pub accepted: Vec<Cluster>,
    pub pool: SimplePool,
}

/// Resolve clusters from the largest size down to `min_super_strings`.
///
/// Each cluster is ranked and capped; one with at least
/// `min_super_strings` remaining is accepted and its files are removed
/// from `pool`. Clusters of equal size are visited in key order. Smaller
/// clusters can never reach the minimum, so they are not visited.
pub fn promote_clusters(
    clusters: BTreeMap<FileSet, Cluster>,
    scorer: &Scorer<'_>,
    settings: ClusterSettings,
    mut pool: SimplePool,
) -> ClusterOutcome {
    let max_size = clusters.values().map(Cluster::len).max().unwrap_or(0);
    let mut by_size: BTreeMap<usize, Vec<Cluster>> = BTreeMap::new();
    for cluster in clusters.into_values() {
        by_size.entry(cluster.len()).or_default().push(cluster);
    }

    let mut accepted = Vec::new();
    let min_size = settings.min_super_strings.max(1);
    for size in (min_size..=max_size).rev() {
        let Some(group) = by_size.remove(&size) else {
            continue;
        };
        for mut cluster in group {
            cluster.strings = select_strings(scorer, &cluster.strings, settings.max_per_rule);
            if cluster.len() < settings.min_super_strings {
                debug!(
                    files = %cluster.key.joined(),
                    strings = cluster.len(),
                    "cluster rejected"
                );
                continue;
            }
            for path in &cluster.files {
                pool.remove(path);
            }
            info!(files = cluster.files.len(), strings = cluster.len(), "accepted super rule");
            accepted.push(cluster);
        }
    }

    ClusterOutcome { accepted, pool }
}
