use crate::analysis::scoring::Scorer;
use crate::model::{ScoredString, StringKey};

/// Rank `scored` by descending score and keep the top entries.
///
/// The sort is stable, so equal scores keep their input order. The cap
/// keeps `max_per_rule + 1` entries: the cut happens once the running
/// count exceeds the configured maximum.
pub fn select_top(mut scored: Vec<ScoredString>, max_per_rule: usize) -> Vec<ScoredString> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(max_per_rule.saturating_add(1));
    scored
}

/// Score `keys` and return the selected strings in ranked order.
pub fn select_strings<'k, I>(scorer: &Scorer<'_>, keys: I, max_per_rule: usize) -> Vec<StringKey>
where
    I: IntoIterator<Item = &'k StringKey>,
{
    select_top(scorer.score_all(keys), max_per_rule).into_iter().map(|s| s.key).collect()
}
