//! Filesystem capability and helpers.
//!
//! Discovery and manifest loading never touch `std::fs` directly: they are
//! handed a [`FileSystem`] at construction time, either [`LocalFileSystem`]
//! for real packages or [`InMemoryFileSystem`] for fixtures.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// Read-only view of a file tree.
pub trait FileSystem {
    /// Returns `true` if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Full paths of the immediate entries of the directory `path`, sorted.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Contents of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Contents of the file at `path` decoded as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// The real, on-disk filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// An in-memory file tree for tests and fixtures.
///
/// Directories are created implicitly for every ancestor of a written file.
#[derive(Debug, Clone)]
pub struct InMemoryFileSystem {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFileSystem {
    /// An empty tree containing only the root directory `/`.
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(PathBuf::from("/"));
        Self {
            files: BTreeMap::new(),
            dirs,
        }
    }

    /// Create a directory and all of its ancestors.
    pub fn create_dir_all(&mut self, path: impl AsRef<Path>) {
        let mut current = Some(path.as_ref());
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || !self.dirs.insert(dir.to_path_buf()) {
                break;
            }
            current = dir.parent();
        }
    }

    /// Write a file, creating its parent directories.
    pub fn write_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent);
        }
        self.files.insert(path.to_path_buf(), contents.into());
    }

    /// Create empty files at each of the given paths.
    pub fn create_empty_files<P: AsRef<Path>>(&mut self, paths: &[P]) {
        for path in paths {
            self.write_file(path, Vec::new());
        }
    }
}

impl FileSystem for InMemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path.display()),
            ));
        }
        let children = self
            .dirs
            .iter()
            .chain(self.files.keys())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect::<BTreeSet<_>>();
        Ok(children.into_iter().collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

/// Returns `true` for dot-prefixed entries, which are never package content.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Recursively copy the directory `src` into `dst`, skipping dot-prefixed
/// entries. `dst` is created if missing.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    ensure_dir(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&path, &target)?;
        } else {
            std::fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_creates_ancestors() {
        let mut fs = InMemoryFileSystem::new();
        fs.create_empty_files(&["/Sources/ModuleA/main.swift"]);
        assert!(fs.is_dir(Path::new("/Sources")));
        assert!(fs.is_dir(Path::new("/Sources/ModuleA")));
        assert!(fs.is_file(Path::new("/Sources/ModuleA/main.swift")));
        assert!(!fs.is_dir(Path::new("/Sources/ModuleA/main.swift")));
    }

    #[test]
    fn in_memory_read_dir_lists_immediate_children_sorted() {
        let mut fs = InMemoryFileSystem::new();
        fs.create_empty_files(&["/pkg/b.c", "/pkg/a.c", "/pkg/sub/c.c"]);
        let entries = fs.read_dir(Path::new("/pkg")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/pkg/a.c"),
                PathBuf::from("/pkg/b.c"),
                PathBuf::from("/pkg/sub"),
            ]
        );
    }

    #[test]
    fn in_memory_read_dir_missing_is_not_found() {
        let fs = InMemoryFileSystem::new();
        let err = fs.read_dir(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn in_memory_read_round_trips_contents() {
        let mut fs = InMemoryFileSystem::new();
        fs.write_file("/pkg/Package.toml", "[package]\nname = \"x\"\n");
        assert_eq!(
            fs.read_to_string(Path::new("/pkg/Package.toml")).unwrap(),
            "[package]\nname = \"x\"\n"
        );
    }

    #[test]
    fn hidden_entries() {
        assert!(is_hidden(Path::new("/pkg/.Bar.swift")));
        assert!(is_hidden(Path::new(".git")));
        assert!(!is_hidden(Path::new("/pkg/Foo.swift")));
    }
}
