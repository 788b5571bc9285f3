use std::fs;

use sigsmith_core::analysis::Aggregator;
use sigsmith_core::model::StringKey;
use sigsmith_core::services::{
    collect_files, extract_file, extract_strings, has_executable_extension, scan_directory,
    sha256_hex, ExtractError, ScanOptions,
};
use tempfile::tempdir;

fn wide(text: &str) -> Vec<u8> {
    text.bytes().flat_map(|b| [b, 0]).collect()
}

#[test]
fn extracts_ascii_and_wide_runs() {
    let mut data = b"\x00\x01hello_world\x00\x02abc\x03".to_vec();
    data.extend(wide("widestring"));
    data.extend([0xff, 0xfe]);

    let strings = extract_strings(&data);
    assert_eq!(strings, vec![StringKey::ascii("hello_world"), StringKey::wide("widestring")]);
}

#[test]
fn repeated_runs_are_reported_once() {
    let data = b"repeat_me\x00repeat_me\x00other_run".to_vec();
    let strings = extract_strings(&data);
    assert_eq!(strings, vec![StringKey::ascii("repeat_me"), StringKey::ascii("other_run")]);
}

#[test]
fn extension_filter_is_case_insensitive() {
    assert!(has_executable_extension("x/Sample.EXE".as_ref()));
    assert!(has_executable_extension("x/thing.infected".as_ref()));
    assert!(!has_executable_extension("x/readme.txt".as_ref()));
    assert!(!has_executable_extension("x/noext".as_ref()));
}

#[test]
fn extract_file_hashes_content() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.bin");
    fs::write(&path, b"payload_string_one").expect("write");

    let extracted = extract_file(&path).expect("extract");
    assert_eq!(extracted.record.hash, sha256_hex(b"payload_string_one"));
    assert_eq!(extracted.record.size, 18);
    assert_eq!(extracted.strings, vec![StringKey::ascii("payload_string_one")]);
}

#[test]
fn collect_respects_recursion_and_executables_only() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.exe"), b"top_level_exe").expect("write");
    fs::write(dir.path().join("b.txt"), b"top_level_txt").expect("write");
    fs::create_dir(dir.path().join("sub")).expect("mkdir");
    fs::write(dir.path().join("sub").join("c.dll"), b"nested_dll").expect("write");

    let flat = collect_files(dir.path(), &ScanOptions::default()).expect("collect");
    let names: Vec<_> =
        flat.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["a.exe", "b.txt"]);

    let options = ScanOptions { recursive: true, executables_only: true, ..ScanOptions::default() };
    let deep = collect_files(dir.path(), &options).expect("collect");
    let names: Vec<_> =
        deep.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["a.exe", "c.dll"]);
}

#[test]
fn scan_skips_oversized_and_duplicate_files() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("one.exe"), b"first_sample_marker").expect("write");
    fs::write(dir.path().join("two.exe"), b"first_sample_marker").expect("write");
    fs::write(dir.path().join("zbig.exe"), vec![b'A'; 4096]).expect("write");

    let options = ScanOptions { max_file_size: 1024, ..ScanOptions::default() };
    let mut aggregator = Aggregator::new();
    let stats = scan_directory(dir.path(), &options, &mut aggregator).expect("scan");

    assert_eq!(stats.added, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);

    let corpus = aggregator.finish();
    assert_eq!(corpus.files().len(), 1);
    assert_eq!(corpus.get(&StringKey::ascii("first_sample_marker")).map(|r| r.file_count), Some(1));
}

#[test]
fn missing_root_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    match collect_files(&missing, &ScanOptions::default()) {
        Err(ExtractError::MissingRoot(path)) => assert_eq!(path, missing),
        other => panic!("expected MissingRoot, got {other:?}"),
    }
}
