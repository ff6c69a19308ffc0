use std::path::Path;

use pkgraph_util::fs::{copy_dir_all, ensure_dir, find_ancestor_with, FileSystem, LocalFileSystem};
use tempfile::TempDir;

#[test]
fn test_find_ancestor_with_direct() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Package.toml"), "").unwrap();
    let result = find_ancestor_with(tmp.path(), "Package.toml");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_nested() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Package.toml"), "").unwrap();
    let nested = tmp.path().join("Sources").join("App").join("deep");
    std::fs::create_dir_all(&nested).unwrap();
    let result = find_ancestor_with(&nested, "Package.toml");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_not_found() {
    let tmp = TempDir::new().unwrap();
    let result = find_ancestor_with(tmp.path(), "NonExistent.file");
    assert_eq!(result, None);
}

#[test]
fn test_ensure_dir_creates_nested() {
    let tmp = TempDir::new().unwrap();
    let deep = tmp.path().join("x").join("y").join("z");
    assert!(!deep.exists());
    ensure_dir(&deep).unwrap();
    assert!(deep.is_dir());
}

#[test]
fn test_local_read_dir_is_sorted() {
    let tmp = TempDir::new().unwrap();
    for name in ["zeta.swift", "alpha.swift", "mid.swift"] {
        std::fs::write(tmp.path().join(name), "").unwrap();
    }
    let entries = LocalFileSystem.read_dir(tmp.path()).unwrap();
    let names: Vec<_> = entries
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["alpha.swift", "mid.swift", "zeta.swift"]);
}

#[test]
fn test_local_file_queries() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("main.c");
    std::fs::write(&file, "int main(void) { return 0; }").unwrap();
    let fs = LocalFileSystem;
    assert!(fs.is_file(&file));
    assert!(!fs.is_dir(&file));
    assert!(fs.is_dir(tmp.path()));
    assert!(!fs.exists(&tmp.path().join("missing.c")));
    assert_eq!(
        fs.read_to_string(&file).unwrap(),
        "int main(void) { return 0; }"
    );
}

#[test]
fn test_copy_dir_all_skips_hidden_entries() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    std::fs::create_dir_all(src.path().join("Sources/Lib")).unwrap();
    std::fs::create_dir_all(src.path().join(".git")).unwrap();
    std::fs::write(src.path().join("Sources/Lib/lib.swift"), "").unwrap();
    std::fs::write(src.path().join(".git/HEAD"), "ref").unwrap();

    let target = dst.path().join("copy");
    copy_dir_all(src.path(), &target).unwrap();

    assert!(target.join("Sources/Lib/lib.swift").is_file());
    assert!(!Path::new(&target.join(".git")).exists());
}
