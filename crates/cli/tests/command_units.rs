use std::fs;

use sigsmith::commands::{apply_overrides, build_request, GenerateArgs};
use sigsmith_core::config::GeneratorConfig;
use sigsmith_core::services::GoodwareSource;
use tempfile::tempdir;

#[test]
fn overrides_replace_only_given_fields() {
    let args = GenerateArgs {
        author: Some("analyst".into()),
        max_strings: Some(12),
        no_super: true,
        ..GenerateArgs::default()
    };
    let config = apply_overrides(GeneratorConfig::default(), &args);

    assert_eq!(config.meta.author, "analyst");
    assert_eq!(config.meta.prefix, "Auto-generated rule");
    assert_eq!(config.max_strings_per_rule, 12);
    assert_eq!(config.min_super_strings, 5);
    assert!(config.no_super);
    assert!(!config.recursive);
}

#[test]
fn build_request_prefers_goodware_dirs_over_store() {
    let dir = tempdir().expect("tempdir");
    let malware = dir.path().join("m");
    let benign = dir.path().join("g");
    let suspicious = dir.path().join("list.txt");
    fs::write(&suspicious, "mimikatz\n").expect("write");

    let args = GenerateArgs {
        malware: vec![malware.display().to_string()],
        goodware_dirs: vec![benign.display().to_string()],
        goodware_recursive: true,
        db: "ignored.db".into(),
        output: dir.path().join("out.yar").display().to_string(),
        suspicious: Some(suspicious.display().to_string()),
        ..GenerateArgs::default()
    };
    let request = build_request(&args).expect("request");

    assert_eq!(request.malware_roots, vec![malware]);
    assert_eq!(request.goodware, GoodwareSource::Directories { roots: vec![benign], recursive: true });
    assert_eq!(request.suspicious_path, Some(suspicious));
}

#[test]
fn build_request_applies_config_file_then_flags() {
    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("settings.yaml");
    fs::write(&config_path, "max_strings_per_rule: 9\nmin_super_strings: 3\n").expect("write");

    let args = GenerateArgs {
        malware: vec![dir.path().display().to_string()],
        db: dir.path().join("good.db").display().to_string(),
        output: dir.path().join("out.yar").display().to_string(),
        config: Some(config_path.display().to_string()),
        min_super_strings: Some(2),
        ..GenerateArgs::default()
    };
    let request = build_request(&args).expect("request");

    assert_eq!(request.config.max_strings_per_rule, 9);
    assert_eq!(request.config.min_super_strings, 2);
    assert_eq!(request.goodware, GoodwareSource::Store(dir.path().join("good.db")));
}

#[test]
fn build_request_requires_malware_dirs() {
    let args = GenerateArgs::default();
    assert!(build_request(&args).is_err());
}
