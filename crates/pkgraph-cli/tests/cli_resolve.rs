use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn pkgraph_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pkgraph").unwrap();
    cmd.env("PKGRAPH_HOME", home).env_remove("PKGRAPH_CACHE_DIR");
    cmd
}

fn write_package(dir: &Path, name: &str, deps: &[(&str, &str)]) {
    let mut manifest = format!("[package]\nname = \"{name}\"\n");
    for (location, version) in deps {
        manifest.push_str(&format!(
            "\n[[dependencies]]\nlocation = \"{location}\"\nversion = \"{version}\"\n"
        ));
    }
    let module_dir = dir.join("Sources").join(name);
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(dir.join("Package.toml"), manifest).unwrap();
    fs::write(module_dir.join(format!("{name}.swift")), "").unwrap();
}

/// An `App` package next to a `mirror/` of published versions, with a
/// `PKGRAPH_HOME` whose config points the cache into the temp dir.
fn setup(tmp: &TempDir) -> std::path::PathBuf {
    let home = tmp.path().join("home");
    fs::create_dir_all(&home).unwrap();
    fs::write(
        home.join("config.toml"),
        format!(
            "[cache]\ndir = '{}'\nlock-timeout-secs = 5\n",
            tmp.path().join("cache").display()
        ),
    )
    .unwrap();

    let mirror = tmp.path().join("mirror");
    write_package(&tmp.path().join("App"), "App", &[("A", "^1.0.0"), ("C", "^1.0.0")]);
    write_package(&mirror.join("A/1.0.0"), "A", &[("D", "1.0.0..<2.0.0")]);
    write_package(&mirror.join("C/1.0.0"), "C", &[("D", "1.5.0..<2.0.0")]);
    for version in ["1.0.0", "1.5.0", "1.9.0", "2.0.0"] {
        write_package(&mirror.join("D").join(version), "D", &[]);
    }
    home
}

#[test]
fn test_resolve_prints_tree_and_fills_cache() {
    let tmp = TempDir::new().unwrap();
    let home = setup(&tmp);
    let mirror = tmp.path().join("mirror");

    pkgraph_cmd(&home)
        .current_dir(tmp.path().join("App"))
        .args(["resolve", "--mirror"])
        .arg(&mirror)
        .assert()
        .success()
        .stdout(predicate::str::contains("├── A v1.0.0 (A)"))
        .stdout(predicate::str::contains("D v1.9.0 (D)"))
        .stderr(predicate::str::contains("Resolved"))
        .stderr(predicate::str::contains("Checkouts"));

    assert!(tmp.path().join("cache").is_dir());
}

#[test]
fn test_resolve_why() {
    let tmp = TempDir::new().unwrap();
    let home = setup(&tmp);
    let mirror = tmp.path().join("mirror");

    pkgraph_cmd(&home)
        .current_dir(tmp.path().join("App"))
        .args(["resolve", "--why", "D", "--mirror"])
        .arg(&mirror)
        .assert()
        .success()
        .stdout(predicate::str::contains("Path to D:"))
        .stdout(predicate::str::contains("    D v1.9.0"));
}

#[test]
fn test_resolve_unsatisfiable_fails() {
    let tmp = TempDir::new().unwrap();
    let home = setup(&tmp);
    let mirror = tmp.path().join("mirror");
    write_package(&mirror.join("C/1.0.0"), "C", &[("D", "2.0.0..<3.0.0")]);

    pkgraph_cmd(&home)
        .current_dir(tmp.path().join("App"))
        .args(["resolve", "--mirror"])
        .arg(&mirror)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no version of 'D' satisfies every requirement"));
}
