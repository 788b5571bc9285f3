use std::collections::HashSet;

use tracing::info;

use crate::analysis::corpus::Corpus;
use crate::model::StringKey;

/// Reference set of strings known to occur in benign files.
///
/// Only key presence matters; counts from the benign side are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoodwareSet {
    keys: HashSet<StringKey>,
}

impl GoodwareSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self { keys: corpus.keys().cloned().collect() }
    }

    pub fn insert(&mut self, key: StringKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &StringKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<StringKey> for GoodwareSet {
    fn from_iter<I: IntoIterator<Item = StringKey>>(iter: I) -> Self {
        Self { keys: iter.into_iter().collect() }
    }
}

/// Drop every string of `corpus` that also appears in `goodware`.
///
/// Matching is exact and encoding-sensitive.
pub fn filter_goodware(corpus: Corpus, goodware: &GoodwareSet) -> Corpus {
    let before = corpus.len();
    let filtered = corpus.retain_strings(|record| !goodware.contains(&record.key));
    info!(
        before,
        after = filtered.len(),
        goodware = goodware.len(),
        "removed goodware strings"
    );
    filtered
}
