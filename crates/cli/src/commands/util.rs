use std::path::PathBuf;

use anyhow::{Context, Result};
use sigsmith_core::config::{load_config, GeneratorConfig};

use crate::absolutize;

/// Suspicious-string list picked up from the working directory when none is given.
pub const DEFAULT_SUSPICIOUS_FILE: &str = "PeStudioBlackListStrings.xml";

/// Load the config file if given, otherwise start from defaults.
pub fn load_generator_config(path: Option<&str>) -> Result<GeneratorConfig> {
    match path {
        Some(p) => {
            let path = absolutize(p)?;
            load_config(&path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(GeneratorConfig::default()),
    }
}

/// Resolve a list of directory arguments to absolute paths.
pub fn resolve_dirs(dirs: &[String]) -> Result<Vec<PathBuf>> {
    dirs.iter().map(|d| absolutize(d)).collect()
}

/// Pick the suspicious-string list: the explicit path, or the default file
/// if it sits in the working directory.
pub fn resolve_suspicious(path: Option<&str>) -> Result<Option<PathBuf>> {
    if let Some(p) = path {
        return Ok(Some(absolutize(p)?));
    }
    let default = absolutize(DEFAULT_SUSPICIOUS_FILE)?;
    if default.is_file() {
        Ok(Some(default))
    } else {
        println!(
            "No suspicious-string list found; place '{}' in the working directory or pass --suspicious to improve scoring.",
            DEFAULT_SUSPICIOUS_FILE
        );
        Ok(None)
    }
}
