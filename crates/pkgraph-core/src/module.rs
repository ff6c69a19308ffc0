//! Discovered modules: one compilation unit of a package.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Source language of a module. A module never mixes languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Swift,
    CFamily,
}

impl Language {
    /// Classify a file extension. Headers and unknown extensions are not
    /// compiled sources and yield `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "swift" => Some(Self::Swift),
            "c" | "m" | "mm" | "cc" | "cpp" | "cxx" | "s" | "S" => Some(Self::CFamily),
            _ => None,
        }
    }

    /// Classify a file path by its extension.
    pub fn of_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// File names that mark a module of this language as executable.
    pub fn entry_points(self) -> &'static [&'static str] {
        match self {
            Self::Swift => &["main.swift"],
            Self::CFamily => &["main.c", "main.m", "main.mm", "main.cc", "main.cpp", "main.cxx"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swift => f.write_str("swift"),
            Self::CFamily => f.write_str("c-family"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    Library,
    Executable,
    /// A module map wrapping a library installed on the system.
    SystemProvided,
    Test,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => f.write_str("library"),
            Self::Executable => f.write_str("executable"),
            Self::SystemProvided => f.write_str("system-provided"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// The source files of a module, relative to its root, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sources {
    pub root: PathBuf,
    pub relative_paths: Vec<PathBuf>,
}

impl Sources {
    pub fn new(root: impl Into<PathBuf>, mut relative_paths: Vec<PathBuf>) -> Self {
        relative_paths.sort();
        relative_paths.dedup();
        Self {
            root: root.into(),
            relative_paths,
        }
    }

    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Vec::new())
    }

    /// Absolute paths of every source file.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.relative_paths.iter().map(|p| self.root.join(p))
    }

    pub fn is_empty(&self) -> bool {
        self.relative_paths.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub name: String,
    /// Identifier-safe form of `name`, see [`c99name`].
    pub c99name: String,
    /// `None` only for system-provided modules, which have no sources.
    pub language: Option<Language>,
    pub kind: ModuleKind,
    pub sources: Sources,
}

impl Module {
    pub fn is_test(&self) -> bool {
        self.kind == ModuleKind::Test
    }

    pub fn is_executable(&self) -> bool {
        self.kind == ModuleKind::Executable
    }
}

/// Canonical identifier for a module name.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_` and a leading digit is
/// prefixed with `_`. Returns `None` for an empty name.
pub fn c99name(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    out.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    Some(out)
}
