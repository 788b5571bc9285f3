use std::fs;
use std::path::Path;

use sigsmith_core::config::GeneratorConfig;
use sigsmith_core::db::{StoreError, StoreMode};
use sigsmith_core::services::{
    build_goodware_store, run_generation, GenerateError, GenerationRequest, GoodwareSource,
    ScanOptions,
};
use tempfile::tempdir;

fn write_samples(dir: &Path) {
    fs::create_dir_all(dir.join("malware")).expect("mkdir malware");
    fs::create_dir_all(dir.join("goodware")).expect("mkdir goodware");

    fs::write(
        dir.join("malware").join("dropper_alpha.exe"),
        "Microsoft Corporation\nattack_cnc_string_xyz\nalpha_only_payload\n",
    )
    .expect("write");
    fs::write(
        dir.join("malware").join("dropper_bravo.exe"),
        "Microsoft Corporation\nattack_cnc_string_xyz\nbravo_only_payload\n",
    )
    .expect("write");
    fs::write(
        dir.join("malware").join("standalone_tool.exe"),
        "Microsoft Corporation\nC:\\Users\\victim\\keylog.txt\n",
    )
    .expect("write");
    fs::write(dir.join("goodware").join("benign.exe"), "Microsoft Corporation\nUntitled - Notepad\n")
        .expect("write");
}

fn request(dir: &Path, goodware: GoodwareSource) -> GenerationRequest {
    GenerationRequest {
        malware_roots: vec![dir.join("malware")],
        goodware,
        suspicious_path: None,
        output: dir.join("rules.yar"),
        config: GeneratorConfig { min_super_strings: 1, ..GeneratorConfig::default() },
    }
}

#[test]
fn end_to_end_with_goodware_directory() {
    let dir = tempdir().expect("tempdir");
    write_samples(dir.path());

    let req = request(
        dir.path(),
        GoodwareSource::Directories { roots: vec![dir.path().join("goodware")], recursive: false },
    );
    let report = run_generation(&req).expect("generation");

    assert_eq!(report.malware_scan.added, 3);
    assert_eq!(report.goodware_strings, 2);
    assert_eq!(report.summary.simple, 1);
    assert_eq!(report.summary.super_rules, 1);
    assert_eq!(report.summary.skipped, 0);

    let text = fs::read_to_string(&req.output).expect("read rules");
    assert!(!text.contains("Microsoft Corporation"));
    assert!(text.contains("rule standalone_tool {"));
    assert!(text.contains("rule _dropper_alpha_dropper_bravo {"));
    assert!(text.contains("\t\t$s0 = \"attack_cnc_string_xyz\" fullword ascii\n"));
    assert!(text.contains("C:\\\\Users\\\\victim\\\\keylog.txt"));
    assert!(text.contains("super_rule = 1"));

    let simple_at = text.find("rule standalone_tool").expect("simple rule");
    let super_at = text.find("rule _dropper_alpha").expect("super rule");
    assert!(simple_at < super_at, "simple rules are written before super rules");
}

#[test]
fn end_to_end_with_goodware_store() {
    let dir = tempdir().expect("tempdir");
    write_samples(dir.path());
    let db_path = dir.path().join("good.db");

    let (stats, scan) = build_goodware_store(
        &[dir.path().join("goodware")],
        &ScanOptions::default(),
        &db_path,
        StoreMode::Create,
    )
    .expect("build store");
    assert_eq!(stats.strings, 2);
    assert_eq!(scan.added, 1);

    let req = request(dir.path(), GoodwareSource::Store(db_path));
    let report = run_generation(&req).expect("generation");
    assert_eq!(report.goodware_strings, 2);
    assert_eq!(report.generation.rules.len(), 2);

    let text = fs::read_to_string(&req.output).expect("read rules");
    assert!(!text.contains("Microsoft Corporation"));
}

#[test]
fn missing_store_aborts_before_writing_output() {
    let dir = tempdir().expect("tempdir");
    write_samples(dir.path());

    let req = request(dir.path(), GoodwareSource::Store(dir.path().join("absent.db")));
    match run_generation(&req) {
        Err(GenerateError::Store(StoreError::Missing(_))) => {}
        other => panic!("expected missing store error, got {:?}", other.map(|r| r.summary)),
    }
    assert!(!req.output.exists());
}

#[test]
fn missing_malware_root_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let req = GenerationRequest {
        malware_roots: vec![dir.path().join("nowhere")],
        goodware: GoodwareSource::Directories { roots: Vec::new(), recursive: false },
        suspicious_path: None,
        output: dir.path().join("rules.yar"),
        config: GeneratorConfig::default(),
    };
    assert!(matches!(run_generation(&req), Err(GenerateError::Extract(_))));
}
