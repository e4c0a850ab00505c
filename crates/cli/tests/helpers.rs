use std::fs;
use std::path::Path;

use sandbox_facts::{canonicalize_or_current, infer_archive_name, sha256_bytes, sha256_file};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_absolute_path() {
    let tmp = tempdir().expect("tempdir");
    let nested = tmp.path().join("nested");
    fs::create_dir_all(&nested).expect("create nested");

    let result =
        canonicalize_or_current(nested.to_str().expect("utf-8 path")).expect("canonicalize");
    assert_eq!(result, nested.canonicalize().expect("canonicalize nested"));
}

#[test]
fn canonicalize_or_current_joins_missing_path_onto_cwd() {
    let result = canonicalize_or_current("does-not-exist-yet").expect("resolve");
    let cwd = std::env::current_dir().expect("cwd");
    assert_eq!(result, cwd.join("does-not-exist-yet"));
}

#[test]
fn infer_archive_name_uses_last_path_component() {
    assert_eq!(infer_archive_name(Path::new("/tmp/malware-corpus")), "malware-corpus");
}

#[test]
fn infer_archive_name_falls_back_when_missing() {
    assert_eq!(infer_archive_name(Path::new("/")), "unnamed-archive");
}

#[test]
fn sha256_helpers_agree() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("sample.bin");
    fs::write(&path, b"abc").expect("write sample");

    let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    assert_eq!(sha256_bytes(b"abc"), expected);
    assert_eq!(sha256_file(&path).expect("hash file"), expected);
}

#[test]
fn sha256_file_errors_for_missing_file() {
    let tmp = tempdir().expect("tempdir");
    let err = sha256_file(&tmp.path().join("missing.bin")).expect_err("missing file");
    assert!(err.to_string().contains("Failed to open sample for hashing"));
}
