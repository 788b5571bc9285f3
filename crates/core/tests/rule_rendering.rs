use chrono::NaiveDate;
use sigsmith_core::model::{FileRecord, Rule, RuleKind, RuleMeta, StringKey};
use sigsmith_core::rules::{
    clean_rule_name, escape_string, render_entry, render_rule, simple_rule_base_name,
    super_rule_base_name, truncate_entry, write_rules, EmitError, RuleBuilder, RuleNamer,
};

fn builder(max: usize) -> RuleBuilder {
    let date = NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");
    RuleBuilder::with_date(RuleMeta::default(), max, date)
}

#[test]
fn simple_rule_renders_exact_text() {
    let mut builder = builder(20);
    let file = FileRecord::new("/samples/dropper_payload.exe", "abc123", 10);
    let rule = builder
        .simple_rule(
            &file,
            vec![StringKey::ascii("C:\\temp\\x.exe"), StringKey::wide("Hello \"World\"")],
        )
        .expect("build rule");

    let expected = concat!(
        "rule dropper_payload {\n",
        "\tmeta:\n",
        "\t\tdescription = \"Auto-generated rule - file dropper_payload.exe\"\n",
        "\t\tauthor = \"sigsmith\"\n",
        "\t\treference = \"not set\"\n",
        "\t\tdate = \"2024/01/02\"\n",
        "\t\thash = \"abc123\"\n",
        "\tstrings:\n",
        "\t\t$s0 = \"C:\\\\temp\\\\x.exe\" fullword ascii\n",
        "\t\t$s1 = \"Hello \\\"World\\\"\" fullword wide\n",
        "\tcondition:\n",
        "\t\tall of them\n",
        "}\n",
    );
    assert_eq!(render_rule(&rule).expect("render"), expected);
}

#[test]
fn super_rule_lists_every_hash_and_marker() {
    let mut builder = builder(20);
    let a = FileRecord::new("/m/alpha.exe", "h_a", 1);
    let b = FileRecord::new("/m/beta-2.dll", "h_b", 1);
    let rule = builder
        .super_rule(&[&a, &b], vec![StringKey::ascii("shared_marker")])
        .expect("build rule");

    assert_eq!(rule.name, "_alpha_beta_2");
    assert_eq!(rule.kind, RuleKind::Super);
    assert_eq!(rule.description, "Auto-generated rule - from files alpha.exe, beta-2.dll");

    let text = render_rule(&rule).expect("render");
    assert!(text.contains("\t\thash0 = \"h_a\"\n\t\thash1 = \"h_b\"\n\t\tsuper_rule = 1\n"));
    assert!(text.contains("\t\t$s0 = \"shared_marker\" fullword ascii\n"));
}

#[test]
fn rule_names_are_cleaned_and_made_unique() {
    assert_eq!(clean_rule_name("9lives-loader.v2"), "sig_9lives_loader_v2");
    assert_eq!(simple_rule_base_name("/samples/apt/a.exe"), "apt_a");
    assert_eq!(simple_rule_base_name("/x/1234567890abc.exe"), "sig_1234567890abc");
    assert_eq!(super_rule_base_name(&["/m/one.exe", "/m/two.exe"]), "_one_two");

    let mut namer = RuleNamer::new();
    assert_eq!(namer.claim("evilpayload"), "evilpayload");
    assert_eq!(namer.claim("evilpayload"), "evilpayload_2");
    assert_eq!(namer.claim("evilpayload"), "evilpayload_3");
    assert_eq!(namer.claim("other"), "other");
}

#[test]
fn colliding_file_stems_get_suffixes() {
    let mut builder = builder(20);
    let first = builder
        .simple_rule(&FileRecord::new("/a/evilpayload.exe", "h1", 1), vec![StringKey::ascii("x_one")])
        .expect("first");
    let second = builder
        .simple_rule(&FileRecord::new("/b/evilpayload.dll", "h2", 1), vec![StringKey::ascii("x_two")])
        .expect("second");
    assert_eq!(first.name, "evilpayload");
    assert_eq!(second.name, "evilpayload_2");
}

#[test]
fn suffixed_names_never_clash_with_real_stems() {
    let mut builder = builder(20);
    let names: Vec<String> = ["/x/abcdefgh.exe", "/y/abcdefgh.exe", "/z/abcdefgh_2.exe"]
        .iter()
        .enumerate()
        .map(|(i, path)| {
            builder
                .simple_rule(&FileRecord::new(*path, format!("h{i}"), 1), vec![StringKey::ascii("entry_x")])
                .expect("build")
                .name
        })
        .collect();
    assert_eq!(names, vec!["abcdefgh", "abcdefgh_2", "abcdefgh_2_2"]);

    let mut namer = RuleNamer::new();
    assert_eq!(namer.claim("dropper_2"), "dropper_2");
    assert_eq!(namer.claim("dropper"), "dropper");
    assert_eq!(namer.claim("dropper"), "dropper_3");
    assert_eq!(namer.claim("dropper"), "dropper_4");
}

#[test]
fn builder_caps_strings_and_rejects_empty_rules() {
    let mut builder = builder(2);
    let strings: Vec<StringKey> = (0..10).map(|i| StringKey::ascii(format!("entry_{i}"))).collect();
    let rule = builder
        .simple_rule(&FileRecord::new("/m/capped_sample.exe", "h", 1), strings)
        .expect("build");
    assert_eq!(rule.strings.len(), 3);

    match builder.simple_rule(&FileRecord::new("/m/empty_sample.exe", "h", 1), Vec::new()) {
        Err(EmitError::EmptyRule(name)) => assert_eq!(name, "empty_sample"),
        other => panic!("expected EmptyRule, got {other:?}"),
    }
}

#[test]
fn escaping_only_touches_quotes_and_backslashes() {
    assert_eq!(escape_string(r#"a"b\c"#), r#"a\"b\\c"#);
    assert_eq!(escape_string("plain text\t%s"), "plain text\t%s");
}

#[test]
fn long_entries_are_cut_and_lose_fullword() {
    let long = "a".repeat(100);
    let (text, fullword) = truncate_entry(&long);
    assert_eq!(text.len(), 80);
    assert!(!fullword);

    let exact = "b".repeat(80);
    assert_eq!(truncate_entry(&exact), (exact.clone(), true));

    let trailing = format!("{}\\\\tail", "c".repeat(79));
    let (text, fullword) = truncate_entry(&trailing);
    assert_eq!(text, "c".repeat(79));
    assert!(!fullword);

    let line = render_entry(3, &StringKey::wide(long));
    assert_eq!(line, format!("\t\t$s3 = \"{}\" wide\n", "a".repeat(80)));
}

#[test]
fn write_rules_skips_unrenderable_rules() {
    let good = Rule {
        name: "good_rule".into(),
        kind: RuleKind::Simple,
        description: "d".into(),
        author: "a".into(),
        reference: "r".into(),
        date: "2024/01/02".into(),
        hashes: vec!["h".into()],
        strings: vec![StringKey::ascii("marker_string")],
    };
    let empty = Rule { name: "empty_rule".into(), strings: Vec::new(), ..good.clone() };
    let sup = Rule { name: "super_rule".into(), kind: RuleKind::Super, ..good.clone() };

    let mut out = Vec::new();
    let summary = write_rules(&mut out, &[good, empty, sup]).expect("write");
    assert_eq!(summary.simple, 1);
    assert_eq!(summary.super_rules, 1);
    assert_eq!(summary.skipped, 1);

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("rule good_rule {"));
    assert!(text.contains("rule super_rule {"));
    assert!(!text.contains("empty_rule"));
}
