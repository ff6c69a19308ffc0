use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::manifest::{Manifest, ProductKind};
use crate::module::Module;
use crate::version::Version;

/// A loaded package: its manifest plus the modules discovered on disk.
#[derive(Debug, Clone)]
pub struct Package {
    pub manifest: Manifest,
    /// `None` only for the root package.
    pub version: Option<Version>,
    pub root: PathBuf,
    pub modules: Vec<Module>,
}

/// A buildable output, either declared in the manifest or implied by an
/// executable module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub kind: ProductKind,
    pub modules: Vec<String>,
    pub implicit: bool,
}

impl Package {
    /// Returns the package name from the manifest.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Returns where the package came from.
    pub fn location(&self) -> &str {
        &self.manifest.location
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Declared products followed by one executable product for every
    /// executable module no declared product lists.
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .manifest
            .products
            .iter()
            .map(|p| Product {
                name: p.name.clone(),
                kind: p.kind,
                modules: p.modules.clone(),
                implicit: false,
            })
            .collect();

        for module in self.modules.iter().filter(|m| m.is_executable()) {
            let covered = self
                .manifest
                .products
                .iter()
                .any(|p| p.modules.iter().any(|name| *name == module.name));
            if !covered {
                products.push(Product {
                    name: module.name.clone(),
                    kind: ProductKind::Executable,
                    modules: vec![module.name.clone()],
                    implicit: true,
                });
            }
        }
        products
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ProductDecl;
    use crate::module::{Language, ModuleKind, Sources};

    fn module(name: &str, kind: ModuleKind) -> Module {
        Module {
            name: name.to_string(),
            c99name: name.to_string(),
            language: Some(Language::Swift),
            kind,
            sources: Sources::empty(format!("/pkg/Sources/{name}")),
        }
    }

    #[test]
    fn executable_modules_get_implicit_products() {
        let package = Package {
            manifest: Manifest::new("Tools", "/pkg"),
            version: None,
            root: PathBuf::from("/pkg"),
            modules: vec![
                module("Core", ModuleKind::Library),
                module("tool", ModuleKind::Executable),
            ],
        };
        let products = package.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "tool");
        assert_eq!(products[0].kind, ProductKind::Executable);
        assert!(products[0].implicit);
    }

    #[test]
    fn declared_product_covers_executable_module() {
        let manifest = Manifest::new("Tools", "/pkg").with_product(ProductDecl {
            name: "the-tool".to_string(),
            kind: ProductKind::Executable,
            modules: vec!["tool".to_string()],
        });
        let package = Package {
            manifest,
            version: Some(Version::new(1, 0, 0)),
            root: PathBuf::from("/pkg"),
            modules: vec![module("tool", ModuleKind::Executable)],
        };
        let products = package.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "the-tool");
        assert!(!products[0].implicit);
    }
}
