use std::io::Write;

use tracing::warn;

use crate::model::{Rule, RuleKind, StringKey};
use crate::rules::{EmitError, EmitResult};

/// Entries longer than this are cut and lose `fullword`.
pub const MAX_ENTRY_CHARS: usize = 80;

/// Escape `\` and `"` for a quoted rule string. Nothing else changes.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Cut overlong text to `MAX_ENTRY_CHARS` and drop trailing backslashes.
///
/// Returns the (possibly shortened) text and whether `fullword` still applies.
pub fn truncate_entry(text: &str) -> (String, bool) {
    if text.chars().count() <= MAX_ENTRY_CHARS {
        return (text.to_string(), true);
    }
    let cut: String = text.chars().take(MAX_ENTRY_CHARS).collect();
    (cut.trim_end_matches('\\').to_string(), false)
}

/// Render a single `$s<i>` line.
pub fn render_entry(index: usize, key: &StringKey) -> String {
    let (text, fullword) = truncate_entry(&key.text);
    let qualifier = if fullword { " fullword" } else { "" };
    format!("\t\t$s{index} = \"{}\"{qualifier} {}\n", escape_string(&text), key.encoding)
}

/// Render one rule as signature text.
pub fn render_rule(rule: &Rule) -> EmitResult<String> {
    if rule.strings.is_empty() {
        return Err(EmitError::EmptyRule(rule.name.clone()));
    }

    let mut out = String::new();
    out.push_str(&format!("rule {} {{\n", rule.name));
    out.push_str("\tmeta:\n");
    out.push_str(&format!("\t\tdescription = \"{}\"\n", escape_string(&rule.description)));
    out.push_str(&format!("\t\tauthor = \"{}\"\n", escape_string(&rule.author)));
    out.push_str(&format!("\t\treference = \"{}\"\n", escape_string(&rule.reference)));
    out.push_str(&format!("\t\tdate = \"{}\"\n", rule.date));
    match rule.kind {
        RuleKind::Simple => {
            for hash in &rule.hashes {
                out.push_str(&format!("\t\thash = \"{hash}\"\n"));
            }
        }
        RuleKind::Super => {
            for (i, hash) in rule.hashes.iter().enumerate() {
                out.push_str(&format!("\t\thash{i} = \"{hash}\"\n"));
            }
            out.push_str("\t\tsuper_rule = 1\n");
        }
    }
    out.push_str("\tstrings:\n");
    for (i, key) in rule.strings.iter().enumerate() {
        out.push_str(&render_entry(i, key));
    }
    out.push_str("\tcondition:\n");
    out.push_str("\t\tall of them\n");
    out.push_str("}\n");
    Ok(out)
}

/// Counts reported after writing a rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EmitSummary {
    pub simple: usize,
    pub super_rules: usize,
    pub skipped: usize,
}

/// Render and write every rule; a rule that fails to render is skipped.
///
/// Only I/O errors on `out` abort the write.
pub fn write_rules<W: Write>(out: &mut W, rules: &[Rule]) -> EmitResult<EmitSummary> {
    let mut summary = EmitSummary::default();
    for rule in rules {
        let text = match render_rule(rule) {
            Ok(text) => text,
            Err(err) => {
                warn!(rule = %rule.name, error = %err, "skipping rule");
                summary.skipped += 1;
                continue;
            }
        };
        out.write_all(text.as_bytes())?;
        match rule.kind {
            RuleKind::Simple => summary.simple += 1,
            RuleKind::Super => summary.super_rules += 1,
        }
    }
    out.flush()?;
    Ok(summary)
}
