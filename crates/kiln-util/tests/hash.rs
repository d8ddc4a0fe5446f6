use kiln_util::hash::{sha256_bytes, sha256_file, sha256_tree};
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_sha256_bytes_empty() {
    let hash = sha256_bytes(b"");
    assert_eq!(
        hash,
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_sha256_bytes_hello() {
    let hash = sha256_bytes(b"hello");
    assert_eq!(
        hash,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn test_sha256_file_matches_bytes() {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(b"hello").unwrap();
    tmp.flush().unwrap();
    let file_hash = sha256_file(tmp.path()).unwrap();
    assert_eq!(file_hash, sha256_bytes(b"hello"));
}

#[test]
fn test_sha256_file_not_found() {
    let result = sha256_file(Path::new("/nonexistent/path/file.txt"));
    assert!(result.is_err());
}

#[test]
fn test_sha256_tree_changes_with_content() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("Main.java");
    std::fs::write(&file, "class Main {}").unwrap();
    let before = sha256_tree(tmp.path(), &[file.clone()]);
    assert_eq!(before, sha256_tree(tmp.path(), &[file.clone()]));

    std::fs::write(&file, "class Main { int x; }").unwrap();
    let after = sha256_tree(tmp.path(), &[file]);
    assert_ne!(before, after);
}

#[test]
fn test_sha256_tree_changes_with_rename() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("A.java");
    let b = tmp.path().join("B.java");
    std::fs::write(&a, "same").unwrap();
    std::fs::write(&b, "same").unwrap();
    assert_ne!(sha256_tree(tmp.path(), &[a]), sha256_tree(tmp.path(), &[b]));
}
