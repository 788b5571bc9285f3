//! Relevance scoring for candidate signature strings.
//!
//! A string's score is the sum of independent signals: a randomness value,
//! a length bonus, membership in the suspicious-string list, and a fixed
//! table of weighted pattern detectors. Scores are unbounded and may be
//! negative.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::analysis::randomness::RandomnessDetector;
use crate::model::{ScoredString, StringKey};

/// Randomness values above this are treated as noise.
pub const RANDOMNESS_CLAMP_THRESHOLD: f64 = 10.0;

/// Value substituted for a clamped randomness signal.
pub const RANDOMNESS_CLAMPED_VALUE: f64 = 1.0;

/// Bonus for an exact hit in the suspicious-string list.
pub const SUSPICIOUS_WEIGHT: f64 = 6.0;

/// Bonus for strings at or above the maximum length.
pub const LONG_STRING_BONUS: f64 = 1.0;

/// One weighted pattern detector.
pub struct Signal {
    pub name: &'static str,
    pub pattern: &'static str,
    pub weight: f64,
}

/// The detector battery, evaluated in order and summed.
pub static SIGNALS: &[Signal] = &[
    Signal {
        name: "path_or_extension",
        pattern: r"(?i)([a-z]:\\|\.exe|\.pdb|\.scr|\.log|\.cfg|\.txt|\.dat|\.msi|\.com|\.bat|\.dll|\.[a-z][a-z][a-z])",
        weight: 4.0,
    },
    Signal {
        name: "system_vocabulary",
        pattern: r"(?i)(cmd.exe|system32|users|Documents and|SystemRoot|Grant|hello|password|process|log|unc)",
        weight: 5.0,
    },
    Signal {
        name: "protocol_vocabulary",
        pattern: r"(?i)(User-Agent|ftp|irc|smtp|command|GET|POST)",
        weight: 5.0,
    },
    Signal {
        name: "http_error_vocabulary",
        pattern: r"(?i)(error|http|port|closed|failed|failure|version)",
        weight: 3.0,
    },
    Signal {
        name: "browser_vocabulary",
        pattern: r"(?i)(Mozilla|MSIE|Windows NT|Macintosh;)",
        weight: 4.0,
    },
    Signal { name: "temp_vocabulary", pattern: r"(?i)(TEMP|Temporary|Appdata|Recycler)", weight: 4.0 },
    Signal {
        name: "offensive_vocabulary",
        pattern: r"(?i)(scan|sniff|poison|fake|spoof|sweep|dump|flood|inject|forward|command)",
        weight: 5.0,
    },
    Signal {
        name: "networking_vocabulary",
        pattern: r"(?i)(address|port|listen|remote|local|process|service|mutex|pipe|frame|key|lookup|connection)",
        weight: 3.0,
    },
    Signal { name: "non_system_drive", pattern: r"(?i)([D-Z]:\\)", weight: 4.0 },
    Signal {
        name: "ipv4_literal",
        pattern: r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
        weight: 4.0,
    },
    Signal {
        name: "credential_dump_vocabulary",
        pattern: r"(?i)(dump|sniff|scan|vulnerable|credentials|creds|coded|p0c|Content|host)",
        weight: 6.0,
    },
    Signal { name: "attribution_marker", pattern: r"(?i)( by | coded | c0d3d |cr3w\b)", weight: 2.0 },
    Signal { name: "trailing_extension", pattern: r"\.[a-zA-Z]{3}\b", weight: 3.0 },
    Signal { name: "all_caps_word", pattern: r"^[A-Z]{6,}$", weight: 2.0 },
    Signal { name: "all_lowercase_word", pattern: r"^[a-z]{6,}$", weight: 2.0 },
    Signal { name: "lowercase_phrase", pattern: r"^[a-z\s]{6,}$", weight: 2.0 },
    Signal { name: "capitalized_word", pattern: r"^[A-Z][a-z]{5,}", weight: 2.0 },
    Signal {
        name: "format_or_unc_token",
        pattern: r"(%[a-z][:\-,;]|\\\\%s|\\\\[A-Z0-9a-z%]+\\[A-Z0-9a-z%]+)",
        weight: 3.0,
    },
    Signal {
        name: "certificate_vocabulary",
        pattern: r"(?i)(thawte|trustcenter|signing|class|crl|CA|certificate|assembly)",
        weight: -4.0,
    },
    Signal {
        name: "command_line_flag",
        pattern: r"(?i)( -[a-z]{0,2}\s?[0-9]?| /[a-z]+\s?\w*)",
        weight: 4.0,
    },
    Signal { name: "system_binary_suffix", pattern: r"(?i)(rundll32\.exe$|kernel\.dll$)", weight: -4.0 },
];

static COMPILED: LazyLock<Vec<Option<Regex>>> =
    LazyLock::new(|| SIGNALS.iter().map(|s| Regex::new(s.pattern).ok()).collect());

/// Names of every detector in `SIGNALS` that matches `text`.
pub fn matched_signals(text: &str) -> Vec<&'static str> {
    SIGNALS
        .iter()
        .zip(COMPILED.iter())
        .filter(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(text)))
        .map(|(signal, _)| signal.name)
        .collect()
}

/// Sum of the weights of every matching detector.
pub fn pattern_score(text: &str) -> f64 {
    SIGNALS
        .iter()
        .zip(COMPILED.iter())
        .filter(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(text)))
        .map(|(signal, _)| signal.weight)
        .sum()
}

/// Length thresholds for the length bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self { min: 5, max: 64 }
    }
}

/// Length component of the score.
///
/// Zero up to `min`, `len / 8` in whole steps strictly between the bounds,
/// and a flat bonus at or above `max`.
pub fn length_bonus(len: usize, bounds: LengthBounds) -> f64 {
    if len >= bounds.max {
        LONG_STRING_BONUS
    } else if len > bounds.min {
        (len / 8) as f64
    } else {
        0.0
    }
}

/// Exact-match list of strings known to be suspicious.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspiciousList {
    entries: HashSet<String>,
}

impl SuspiciousList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SuspiciousList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(Into::into).collect() }
    }
}

/// Scores strings against the heuristic signal battery.
pub struct Scorer<'a> {
    bounds: LengthBounds,
    suspicious: &'a SuspiciousList,
    detector: &'a dyn RandomnessDetector,
}

impl<'a> Scorer<'a> {
    pub fn new(
        bounds: LengthBounds,
        suspicious: &'a SuspiciousList,
        detector: &'a dyn RandomnessDetector,
    ) -> Self {
        Self { bounds, suspicious, detector }
    }

    /// Randomness component, with values above the threshold clamped.
    pub fn randomness(&self, text: &str) -> f64 {
        let raw = self.detector.score(text);
        if raw > RANDOMNESS_CLAMP_THRESHOLD {
            RANDOMNESS_CLAMPED_VALUE
        } else {
            raw
        }
    }

    pub fn score(&self, key: &StringKey) -> f64 {
        let text = key.text.as_str();
        let mut score = self.randomness(text);
        score += length_bonus(key.char_len(), self.bounds);
        if self.suspicious.contains(text) {
            score += SUSPICIOUS_WEIGHT;
        }
        score += pattern_score(text);
        trace!(score, encoding = %key.encoding, text, "scored string");
        score
    }

    /// Score every key, preserving input order.
    pub fn score_all<'k, I>(&self, keys: I) -> Vec<ScoredString>
    where
        I: IntoIterator<Item = &'k StringKey>,
    {
        keys.into_iter().map(|key| ScoredString { key: key.clone(), score: self.score(key) }).collect()
    }
}
