use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::cluster::{build_clusters, promote_clusters, ClusterOutcome, SimplePool};
use crate::analysis::corpus::{Aggregator, Corpus};
use crate::analysis::goodware::{filter_goodware, GoodwareSet};
use crate::analysis::randomness::{EntropyDetector, RandomnessDetector};
use crate::analysis::scoring::{Scorer, SuspiciousList};
use crate::analysis::select::select_strings;
use crate::config::{ConfigError, GeneratorConfig};
use crate::db::{GoodwareDb, MergeStats, StoreError, StoreMode};
use crate::model::{FileRecord, Rule};
use crate::rules::{write_rules, EmitError, EmitSummary, RuleBuilder};
use crate::services::extract::{scan_directory, ExtractError, ScanOptions, ScanStats};
use crate::services::suspicious::load_suspicious_list;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("Failed to create output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for whole-run operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Rules produced by one generation pass.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Simple rules first, then super-rules.
    pub rules: Vec<Rule>,
    /// Strings left after goodware filtering.
    pub filtered_strings: usize,
    /// Rules dropped because they could not be built.
    pub skipped: usize,
}

impl Generation {
    pub fn simple_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.kind == crate::model::RuleKind::Simple)
    }

    pub fn super_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.kind == crate::model::RuleKind::Super)
    }
}

/// Runs filtering, clustering, selection, and rule building over a corpus.
pub struct Generator<'a> {
    pub config: &'a GeneratorConfig,
    pub suspicious: &'a SuspiciousList,
    pub detector: &'a dyn RandomnessDetector,
    /// Date stamped into rule metadata; today when `None`.
    pub date: Option<NaiveDate>,
}

impl<'a> Generator<'a> {
    pub fn new(
        config: &'a GeneratorConfig,
        suspicious: &'a SuspiciousList,
        detector: &'a dyn RandomnessDetector,
    ) -> Self {
        Self { config, suspicious, detector, date: None }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn generate(&self, malware: Corpus, goodware: &GoodwareSet) -> Generation {
        let config = self.config;
        let corpus = filter_goodware(malware, goodware);
        let scorer = Scorer::new(config.length_bounds(), self.suspicious, self.detector);
        let pool = SimplePool::from_corpus(&corpus, config.max_file_count);

        let ClusterOutcome { accepted, pool } = if config.no_super {
            ClusterOutcome { accepted: Vec::new(), pool }
        } else {
            promote_clusters(build_clusters(&corpus), &scorer, config.cluster_settings(), pool)
        };

        let mut builder = match self.date {
            Some(date) => RuleBuilder::with_date(config.meta.clone(), config.max_strings_per_rule, date),
            None => RuleBuilder::new(config.meta.clone(), config.max_strings_per_rule),
        };
        let mut generation = Generation { filtered_strings: corpus.len(), ..Generation::default() };

        for (path, strings) in pool.iter() {
            let selected = select_strings(&scorer, strings, config.max_strings_per_rule);
            let built = corpus
                .file(path)
                .ok_or_else(|| EmitError::MissingFile(path.to_string()))
                .and_then(|file| builder.simple_rule(file, selected));
            match built {
                Ok(rule) => generation.rules.push(rule),
                Err(err) => {
                    warn!(path, error = %err, "skipping simple rule");
                    generation.skipped += 1;
                }
            }
        }

        for cluster in accepted {
            let files: Result<Vec<&FileRecord>, EmitError> = cluster
                .files
                .iter()
                .map(|p| corpus.file(p).ok_or_else(|| EmitError::MissingFile(p.clone())))
                .collect();
            match files.and_then(|files| builder.super_rule(&files, cluster.strings)) {
                Ok(rule) => generation.rules.push(rule),
                Err(err) => {
                    warn!(files = %cluster.key.joined(), error = %err, "skipping super rule");
                    generation.skipped += 1;
                }
            }
        }

        info!(
            rules = generation.rules.len(),
            skipped = generation.skipped,
            "rule generation finished"
        );
        generation
    }
}

/// Scan every root into one corpus.
pub fn scan_corpus(roots: &[PathBuf], options: &ScanOptions) -> GenerateResult<(Corpus, ScanStats)> {
    let mut aggregator = Aggregator::new();
    let mut total = ScanStats::default();
    for root in roots {
        let stats = scan_directory(root, options, &mut aggregator)?;
        total.added += stats.added;
        total.duplicates += stats.duplicates;
        total.skipped += stats.skipped;
        total.failed += stats.failed;
    }
    Ok((aggregator.finish(), total))
}

/// Scan benign files and write them to the store at `db_path`.
///
/// `StoreMode::Create` discards any existing store first.
pub fn build_goodware_store(
    roots: &[PathBuf],
    options: &ScanOptions,
    db_path: &Path,
    mode: StoreMode,
) -> GenerateResult<(MergeStats, ScanStats)> {
    let (corpus, scan) = scan_corpus(roots, options)?;
    let db = match mode {
        StoreMode::Create => GoodwareDb::create(db_path)?,
        StoreMode::Update => GoodwareDb::open(db_path)?,
    };
    let stats = db.merge_corpus(&corpus, mode)?;
    info!(db = %db_path.display(), strings = stats.strings, files = stats.files, "goodware store written");
    Ok((stats, scan))
}

/// Where the benign reference set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoodwareSource {
    /// A previously built store; failing to read it aborts the run.
    Store(PathBuf),
    /// A fresh scan of benign directories.
    Directories { roots: Vec<PathBuf>, recursive: bool },
}

/// Everything one end-to-end run needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub malware_roots: Vec<PathBuf>,
    pub goodware: GoodwareSource,
    pub suspicious_path: Option<PathBuf>,
    pub output: PathBuf,
    pub config: GeneratorConfig,
}

/// Outcome of an end-to-end run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub malware_scan: ScanStats,
    pub goodware_strings: usize,
    pub summary: EmitSummary,
    pub generation: Generation,
}

/// Load the reference set named by `source`.
pub fn load_goodware(source: &GoodwareSource, options: &ScanOptions) -> GenerateResult<GoodwareSet> {
    match source {
        GoodwareSource::Store(path) => {
            let db = GoodwareDb::open_existing(path)?;
            let set = db.load_goodware_set()?;
            if set.is_empty() {
                warn!(db = %path.display(), "goodware store is empty; output will be noisy");
            }
            Ok(set)
        }
        GoodwareSource::Directories { roots, recursive } => {
            let options = ScanOptions { recursive: *recursive, ..*options };
            let (corpus, _) = scan_corpus(roots, &options)?;
            Ok(GoodwareSet::from_corpus(&corpus))
        }
    }
}

/// Scan, filter, cluster, and write rules to `request.output`.
pub fn run_generation(request: &GenerationRequest) -> GenerateResult<RunReport> {
    request.config.validate()?;
    let options = request.config.scan_options();

    // The reference set is loaded first so a broken store aborts before any scanning.
    let goodware = load_goodware(&request.goodware, &options)?;
    let suspicious = match &request.suspicious_path {
        Some(path) => load_suspicious_list(path),
        None => SuspiciousList::new(),
    };

    let (malware, malware_scan) = scan_corpus(&request.malware_roots, &options)?;

    let detector = EntropyDetector;
    let generation = Generator::new(&request.config, &suspicious, &detector).generate(malware, &goodware);

    let file = fs::File::create(&request.output)
        .map_err(|source| GenerateError::Output { path: request.output.clone(), source })?;
    let mut out = BufWriter::new(file);
    let mut summary = write_rules(&mut out, &generation.rules)?;
    summary.skipped += generation.skipped;

    Ok(RunReport { malware_scan, goodware_strings: goodware.len(), summary, generation })
}
