//! Run configuration.
//!
//! `GeneratorConfig` carries every tunable of a generation run. It can be
//! read from a JSON or YAML file (picked by extension); frontends then
//! apply their own overrides and call `validate`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::cluster::ClusterSettings;
use crate::analysis::scoring::LengthBounds;
use crate::model::RuleMeta;
use crate::services::extract::ScanOptions;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Strings at or below this length get no length bonus.
    pub min_string_len: usize,
    /// Strings at or above this length get the flat length bonus.
    pub max_string_len: usize,
    /// Maximum strings per rule (the selector keeps one more).
    pub max_strings_per_rule: usize,
    /// Minimum selected strings for a cluster to become a super-rule.
    pub min_super_strings: usize,
    /// Strings seen in this many malware files or more are left out of simple rules.
    pub max_file_count: usize,
    /// Files larger than this many bytes are not scanned.
    pub max_file_size: u64,
    pub executables_only: bool,
    /// Skip super-rule generation entirely.
    pub no_super: bool,
    pub recursive: bool,
    pub meta: RuleMeta,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_string_len: 5,
            max_string_len: 64,
            max_strings_per_rule: 20,
            min_super_strings: 5,
            max_file_count: 10,
            max_file_size: 2_000_000,
            executables_only: false,
            no_super: false,
            recursive: false,
            meta: RuleMeta::default(),
        }
    }
}

impl GeneratorConfig {
    /// Reject combinations that cannot produce sensible rules.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_string_len >= self.max_string_len {
            return Err(ConfigError::Invalid(format!(
                "min_string_len ({}) must be below max_string_len ({})",
                self.min_string_len, self.max_string_len
            )));
        }
        if self.max_strings_per_rule == 0 {
            return Err(ConfigError::Invalid("max_strings_per_rule must be at least 1".into()));
        }
        if self.max_file_count < 2 {
            return Err(ConfigError::Invalid("max_file_count must be at least 2".into()));
        }
        Ok(())
    }

    pub fn length_bounds(&self) -> LengthBounds {
        LengthBounds { min: self.min_string_len, max: self.max_string_len }
    }

    pub fn cluster_settings(&self) -> ClusterSettings {
        ClusterSettings {
            max_per_rule: self.max_strings_per_rule,
            min_super_strings: self.min_super_strings,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            recursive: self.recursive,
            executables_only: self.executables_only,
            max_file_size: self.max_file_size,
        }
    }
}

/// Load a config file; `.yaml`/`.yml` parse as YAML, everything else as JSON.
pub fn load_config(path: &Path) -> ConfigResult<GeneratorConfig> {
    let body = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let config: GeneratorConfig = if matches!(ext, "yaml" | "yml") {
        serde_yaml::from_str(&body)?
    } else {
        serde_json::from_str(&body)?
    };
    config.validate()?;
    Ok(config)
}
