use anyhow::{anyhow, Context, Result};
use clap::Args;
use sigsmith_core::config::GeneratorConfig;
use sigsmith_core::db::DEFAULT_DB_FILE;
use sigsmith_core::services::{run_generation, GenerationRequest, GoodwareSource, RunReport};

use crate::absolutize;
use crate::commands::{load_generator_config, resolve_dirs, resolve_suspicious};

/// Default output file for generated rules.
pub const DEFAULT_OUTPUT_FILE: &str = "sigsmith_rules.yar";

/// Arguments for `sigsmith generate`.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Directory with malware samples (repeatable).
    #[arg(long = "malware", required = true)]
    pub malware: Vec<String>,

    /// Scan these benign directories instead of reading the goodware database.
    #[arg(long = "goodware-dir")]
    pub goodware_dirs: Vec<String>,

    /// Goodware database to filter against when no `--goodware-dir` is given.
    #[arg(long, default_value = DEFAULT_DB_FILE)]
    pub db: String,

    /// Output rule file.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: String,

    /// JSON or YAML file with generator settings; flags override it.
    #[arg(long)]
    pub config: Option<String>,

    /// Suspicious-string list (plain text, or XML with <String> elements).
    #[arg(long)]
    pub suspicious: Option<String>,

    /// Recurse into malware directories.
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Recurse into goodware directories.
    #[arg(long, default_value_t = false)]
    pub goodware_recursive: bool,

    /// Prefix for the rule description.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Author written into rule metadata.
    #[arg(long)]
    pub author: Option<String>,

    /// Reference written into rule metadata.
    #[arg(long)]
    pub reference: Option<String>,

    /// Strings at or below this length get no length bonus.
    #[arg(long)]
    pub min_len: Option<usize>,

    /// Strings at or above this length get the flat length bonus.
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Maximum strings per rule.
    #[arg(long)]
    pub max_strings: Option<usize>,

    /// Minimum strings for a super rule.
    #[arg(long)]
    pub min_super_strings: Option<usize>,

    /// Strings found in this many malware files or more are left out of simple rules.
    #[arg(long)]
    pub max_file_count: Option<usize>,

    /// Skip files larger than this many bytes.
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Only scan executable-like extensions (exe, dll, cmd, asp, php, jsp, bin, infected).
    #[arg(long, default_value_t = false)]
    pub only_executables: bool,

    /// Don't build super rules that match several files.
    #[arg(long, default_value_t = false)]
    pub no_super: bool,
}

/// Apply command-line overrides on top of a loaded config.
pub fn apply_overrides(mut config: GeneratorConfig, args: &GenerateArgs) -> GeneratorConfig {
    if let Some(v) = &args.prefix {
        config.meta.prefix = v.clone();
    }
    if let Some(v) = &args.author {
        config.meta.author = v.clone();
    }
    if let Some(v) = &args.reference {
        config.meta.reference = v.clone();
    }
    if let Some(v) = args.min_len {
        config.min_string_len = v;
    }
    if let Some(v) = args.max_len {
        config.max_string_len = v;
    }
    if let Some(v) = args.max_strings {
        config.max_strings_per_rule = v;
    }
    if let Some(v) = args.min_super_strings {
        config.min_super_strings = v;
    }
    if let Some(v) = args.max_file_count {
        config.max_file_count = v;
    }
    if let Some(v) = args.max_file_size {
        config.max_file_size = v;
    }
    if args.recursive {
        config.recursive = true;
    }
    if args.only_executables {
        config.executables_only = true;
    }
    if args.no_super {
        config.no_super = true;
    }
    config
}

/// Build the core request from parsed arguments.
pub fn build_request(args: &GenerateArgs) -> Result<GenerationRequest> {
    if args.malware.is_empty() {
        return Err(anyhow!("At least one --malware directory is required"));
    }
    let config = apply_overrides(load_generator_config(args.config.as_deref())?, args);
    config.validate().context("Invalid generator settings")?;

    let goodware = if args.goodware_dirs.is_empty() {
        GoodwareSource::Store(absolutize(&args.db)?)
    } else {
        GoodwareSource::Directories {
            roots: resolve_dirs(&args.goodware_dirs)?,
            recursive: args.goodware_recursive,
        }
    };

    Ok(GenerationRequest {
        malware_roots: resolve_dirs(&args.malware)?,
        goodware,
        suspicious_path: resolve_suspicious(args.suspicious.as_deref())?,
        output: absolutize(&args.output)?,
        config,
    })
}

/// Run the full pipeline and report rule counts.
pub fn generate_command(args: &GenerateArgs) -> Result<RunReport> {
    let request = build_request(args)?;

    match &request.goodware {
        GoodwareSource::Store(path) => {
            println!("Reading goodware strings from database {} ...", path.display())
        }
        GoodwareSource::Directories { .. } => println!("Processing goodware files ..."),
    }
    println!("Processing malware files ...");

    let report = run_generation(&request).context("Rule generation failed")?;

    println!(
        "Scanned {} malware files ({} duplicates, {} skipped, {} unreadable).",
        report.malware_scan.added,
        report.malware_scan.duplicates,
        report.malware_scan.skipped,
        report.malware_scan.failed
    );
    println!("Goodware reference strings: {}", report.goodware_strings);
    println!("Generated {} SIMPLE rules.", report.summary.simple);
    if !request.config.no_super {
        println!("Generated {} SUPER rules.", report.summary.super_rules);
    }
    if report.summary.skipped > 0 {
        println!("Skipped {} rules that could not be built.", report.summary.skipped);
    }
    println!("All rules written to {}", request.output.display());

    Ok(report)
}
