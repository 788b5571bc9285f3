use chrono::NaiveDate;
use proptest::prelude::*;
use sigsmith_core::analysis::{aggregate, select_top, FixedDetector, GoodwareSet, SuspiciousList};
use sigsmith_core::config::GeneratorConfig;
use sigsmith_core::model::{ExtractedFile, FileRecord, ScoredString, StringKey};
use sigsmith_core::rules::{escape_string, truncate_entry, MAX_ENTRY_CHARS};
use sigsmith_core::services::Generator;

fn unescape(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn corpus_files(samples: &[Vec<String>]) -> Vec<ExtractedFile> {
    samples
        .iter()
        .enumerate()
        .map(|(i, strings)| ExtractedFile {
            record: FileRecord::new(format!("/m/sample_{i:02}.exe"), format!("hash{i}"), 1),
            strings: strings.iter().map(|s| StringKey::ascii(s.clone())).collect(),
        })
        .collect()
}

proptest! {
    #[test]
    fn selection_never_exceeds_cap(scores in prop::collection::vec(-20.0f64..20.0, 0..60), max in 1usize..30) {
        let scored: Vec<ScoredString> = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScoredString { key: StringKey::ascii(format!("s{i}")), score })
            .collect();
        let top = select_top(scored, max);
        prop_assert!(top.len() <= max + 1);
        prop_assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn short_entries_escape_reversibly(text in "[ -~]{0,80}") {
        let (cut, fullword) = truncate_entry(&text);
        prop_assert!(fullword);
        prop_assert_eq!(&cut, &text);
        prop_assert_eq!(unescape(&escape_string(&cut)), text);
    }

    #[test]
    fn truncated_entries_fit_the_limit(text in "[ -~]{81,200}") {
        let (cut, fullword) = truncate_entry(&text);
        prop_assert!(!fullword);
        prop_assert!(cut.chars().count() <= MAX_ENTRY_CHARS);
        prop_assert!(!cut.ends_with('\\'));
    }

    #[test]
    fn generation_is_deterministic(
        samples in prop::collection::vec(prop::collection::vec("[a-f]{6,10}", 1..8), 1..6)
    ) {
        let config = GeneratorConfig { min_super_strings: 1, max_strings_per_rule: 3, ..GeneratorConfig::default() };
        let suspicious = SuspiciousList::new();
        let detector = FixedDetector(0.0);
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date");
        let generator = Generator::new(&config, &suspicious, &detector).with_date(date);

        let first = generator.generate(aggregate(corpus_files(&samples)), &GoodwareSet::new());
        let second = generator.generate(aggregate(corpus_files(&samples)), &GoodwareSet::new());
        prop_assert_eq!(&first.rules, &second.rules);

        for rule in &first.rules {
            prop_assert!(rule.strings.len() <= config.max_strings_per_rule + 1);
        }
    }
}
