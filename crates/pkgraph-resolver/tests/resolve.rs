use std::fs;
use std::path::Path;
use std::time::Duration;

use pkgraph_core::manifest::{ManifestLoader, TomlManifestLoader};
use pkgraph_core::module::ModuleKind;
use pkgraph_core::version::Version;
use pkgraph_resolver::cache::CheckoutCache;
use pkgraph_resolver::graph::{GraphError, PackageGraph};
use pkgraph_resolver::resolver::{ResolveError, Resolver};
use pkgraph_resolver::source::DirectorySource;
use pkgraph_util::fs::LocalFileSystem;

/// Write a package into `dir` with one library module per entry of `modules`.
fn write_package(dir: &Path, name: &str, deps: &[(&str, &str)], modules: &[&str]) {
    let mut manifest = format!("[package]\nname = \"{name}\"\n");
    for (location, version) in deps {
        manifest.push_str(&format!(
            "\n[[dependencies]]\nlocation = \"{location}\"\nversion = \"{version}\"\n"
        ));
    }
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("Package.toml"), manifest).unwrap();
    for module in modules {
        let module_dir = dir.join("Sources").join(module);
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(module_dir.join(format!("{module}.swift")), "").unwrap();
    }
}

struct Workspace {
    _tmp: tempfile::TempDir,
    root: std::path::PathBuf,
    mirror: std::path::PathBuf,
    cache: std::path::PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("App");
        let mirror = tmp.path().join("mirror");
        let cache = tmp.path().join("cache");
        Self {
            _tmp: tmp,
            root,
            mirror,
            cache,
        }
    }

    fn publish(&self, name: &str, version: &str, deps: &[(&str, &str)], modules: &[&str]) {
        write_package(&self.mirror.join(name).join(version), name, deps, modules);
    }

    fn source(&self) -> DirectorySource {
        DirectorySource::new(
            &self.mirror,
            CheckoutCache::new(&self.cache, Duration::from_secs(5)),
        )
    }
}

#[test]
fn test_resolves_diamond_from_directory_mirror() {
    let ws = Workspace::new();
    write_package(
        &ws.root,
        "App",
        &[("A", "^1.0.0"), ("C", "^1.0.0")],
        &["App"],
    );
    ws.publish("A", "1.0.0", &[("D", "1.0.0..<2.0.0")], &["A"]);
    ws.publish("C", "1.0.0", &[("D", "1.5.0..<2.0.0")], &["C"]);
    for version in ["1.0.0", "1.5.0", "1.9.0", "2.0.0"] {
        ws.publish("D", version, &[], &["D"]);
    }

    let fs = LocalFileSystem;
    let loader = TomlManifestLoader::new(&fs);
    let source = ws.source();
    let root = loader.load(&ws.root, &ws.root.display().to_string()).unwrap();

    let resolution = Resolver::new(&source, &loader).resolve(&root).unwrap();
    assert_eq!(resolution.version_of("D"), Some(&Version::new(1, 9, 0)));
    assert!(resolution.get("D").unwrap().path.starts_with(&ws.cache));

    let graph = PackageGraph::build(&resolution, &ws.root, &fs).unwrap();
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.modules().count(), 4);
    let order: Vec<&str> = graph.build_order().iter().map(|p| p.name()).collect();
    assert_eq!(order.first(), Some(&"D"));
    assert_eq!(order.last(), Some(&"App"));
    assert!(graph
        .modules()
        .all(|(_, module)| module.kind == ModuleKind::Library));
}

#[test]
fn test_unresolvable_constraints_name_every_consumer() {
    let ws = Workspace::new();
    write_package(&ws.root, "App", &[("A", "1.0.0"), ("C", "1.0.0")], &["App"]);
    ws.publish("A", "1.0.0", &[("D", "1.0.0..<2.0.0")], &["A"]);
    ws.publish("C", "1.0.0", &[("D", "2.0.0..<3.0.0")], &["C"]);
    ws.publish("D", "1.9.0", &[], &["D"]);
    ws.publish("D", "2.0.0", &[], &["D"]);

    let fs = LocalFileSystem;
    let loader = TomlManifestLoader::new(&fs);
    let source = ws.source();
    let root = loader.load(&ws.root, "App").unwrap();

    let err = Resolver::new(&source, &loader).resolve(&root).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::UnresolvableConstraints { ref location, .. } if location == "D"
    ));
    let message = err.to_string();
    assert!(message.contains("'A' requires 1.0.0..<2.0.0"));
    assert!(message.contains("'C' requires 2.0.0..<3.0.0"));
}

#[test]
fn test_duplicate_module_across_packages() {
    let ws = Workspace::new();
    write_package(&ws.root, "App", &[("A", "1.0.0"), ("B", "1.0.0")], &["App"]);
    ws.publish("A", "1.0.0", &[], &["Utils"]);
    ws.publish("B", "1.0.0", &[], &["Utils"]);

    let fs = LocalFileSystem;
    let loader = TomlManifestLoader::new(&fs);
    let source = ws.source();
    let root = loader.load(&ws.root, "App").unwrap();
    let resolution = Resolver::new(&source, &loader).resolve(&root).unwrap();

    match PackageGraph::build(&resolution, &ws.root, &fs).unwrap_err() {
        GraphError::DuplicateModule { name, locations } => {
            assert_eq!(name, "Utils");
            assert_eq!(locations, vec!["A", "B"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_dependency_manifest() {
    let ws = Workspace::new();
    write_package(&ws.root, "App", &[("A", "1.0.0")], &["App"]);
    let broken = ws.mirror.join("A").join("1.0.0");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("Package.toml"), "[package\n").unwrap();

    let fs = LocalFileSystem;
    let loader = TomlManifestLoader::new(&fs);
    let source = ws.source();
    let root = loader.load(&ws.root, "App").unwrap();

    match Resolver::new(&source, &loader).resolve(&root).unwrap_err() {
        ResolveError::Manifest { location, .. } => assert_eq!(location, "A"),
        other => panic!("unexpected error: {other}"),
    }
}
