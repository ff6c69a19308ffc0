//! The validated package graph handed to the build stage.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use miette::Diagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use pkgraph_core::module::Module;
use pkgraph_core::package::Package;
use pkgraph_core::version::VersionRange;
use pkgraph_loading::{ModuleError, PackageBuilder};
use pkgraph_util::fs::FileSystem;
use thiserror::Error;

use crate::resolver::Resolution;

/// One package that failed to load, with its location.
#[derive(Debug, Error, Diagnostic)]
#[error("package '{location}' failed to load")]
#[diagnostic(code(pkgraph::graph::package))]
pub struct PackageFailure {
    pub location: String,
    #[source]
    #[diagnostic_source]
    pub source: ModuleError,
}

/// Errors raised while assembling the package graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("{} package(s) failed to load: {}", .failures.len(), failed_locations(.failures))]
    #[diagnostic(code(pkgraph::graph::loading))]
    PackageLoading {
        #[related]
        failures: Vec<PackageFailure>,
    },

    #[error("module '{name}' is defined by more than one package: {}", .locations.join(", "))]
    #[diagnostic(
        code(pkgraph::graph::duplicate_module),
        help("module names must be unique across the whole dependency graph")
    )]
    DuplicateModule { name: String, locations: Vec<String> },

    #[error("product '{name}' is defined by more than one package: {}", .locations.join(", "))]
    #[diagnostic(
        code(pkgraph::graph::duplicate_product),
        help("product names must be unique across the whole dependency graph")
    )]
    DuplicateProduct { name: String, locations: Vec<String> },

    #[error("cyclic dependency: {path}")]
    #[diagnostic(code(pkgraph::graph::cycle))]
    Cycle { path: String },
}

fn failed_locations(failures: &[PackageFailure]) -> String {
    failures
        .iter()
        .map(|f| f.location.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolved packages as nodes, consumer → dependency edges labelled with the
/// range the consumer declared.
///
/// Acyclic, with one node per location and unique module and product names.
#[derive(Debug)]
pub struct PackageGraph {
    graph: DiGraph<Package, VersionRange>,
    /// Lookup from location to node index.
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl PackageGraph {
    /// Load every package of `resolution` from disk and validate the result.
    ///
    /// The root package is built with its test modules, dependencies without.
    /// Every package is attempted before loading failures are reported.
    pub fn build(
        resolution: &Resolution,
        root_path: &Path,
        fs: &dyn FileSystem,
    ) -> Result<Self, GraphError> {
        let mut failures = Vec::new();
        let mut loaded = Vec::new();

        match PackageBuilder::new(resolution.root.clone(), root_path, fs).construct(true) {
            Ok(package) => loaded.push(package),
            Err(source) => failures.push(PackageFailure {
                location: resolution.root.location.clone(),
                source,
            }),
        }
        for (location, resolved) in &resolution.packages {
            let builder = PackageBuilder::new(resolved.manifest.clone(), &resolved.path, fs);
            match builder.construct(false) {
                Ok(package) => loaded.push(package),
                Err(source) => failures.push(PackageFailure {
                    location: location.clone(),
                    source,
                }),
            }
        }
        if !failures.is_empty() {
            return Err(GraphError::PackageLoading { failures });
        }

        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for package in loaded {
            let location = package.location().to_string();
            let idx = graph.add_node(package);
            index.insert(location, idx);
        }
        let root = index
            .get(&resolution.root.location)
            .copied()
            .unwrap_or_else(|| NodeIndex::new(0));

        for edge in &resolution.edges {
            if let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) {
                if graph.find_edge(from, to).is_none() {
                    graph.add_edge(from, to, edge.range.clone());
                }
            }
        }

        let package_graph = Self { graph, index, root };
        package_graph.validate()?;
        tracing::debug!("package graph: {} packages", package_graph.len());
        Ok(package_graph)
    }

    fn validate(&self) -> Result<(), GraphError> {
        let mut modules: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut products: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for package in self.packages() {
            for module in &package.modules {
                modules
                    .entry(module.name.as_str())
                    .or_default()
                    .push(package.location().to_string());
            }
            for product in package.products() {
                products
                    .entry(product.name)
                    .or_default()
                    .push(package.location().to_string());
            }
        }
        if let Some((name, locations)) = modules.into_iter().find(|(_, l)| l.len() > 1) {
            return Err(GraphError::DuplicateModule {
                name: name.to_string(),
                locations,
            });
        }
        if let Some((name, locations)) = products.into_iter().find(|(_, l)| l.len() > 1) {
            return Err(GraphError::DuplicateProduct { name, locations });
        }

        if let Err(cycle) = petgraph::algo::toposort(&self.graph, None) {
            let path = cycle_path(&self.graph, &[cycle.node_id()])
                .into_iter()
                .map(|idx| self.graph[idx].location())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(GraphError::Cycle { path });
        }
        Ok(())
    }

    /// The root package.
    pub fn root(&self) -> &Package {
        &self.graph[self.root]
    }

    /// All packages, root first, then dependencies ordered by location.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Look up a package by location.
    pub fn package(&self, location: &str) -> Option<&Package> {
        self.index.get(location).map(|&idx| &self.graph[idx])
    }

    /// Direct dependencies of the package at `location`.
    pub fn dependencies_of(&self, location: &str) -> Vec<(&Package, &VersionRange)> {
        self.neighbors(location, Direction::Outgoing)
    }

    /// Packages that depend directly on the package at `location`.
    pub fn dependents_of(&self, location: &str) -> Vec<(&Package, &VersionRange)> {
        self.neighbors(location, Direction::Incoming)
    }

    fn neighbors(&self, location: &str, direction: Direction) -> Vec<(&Package, &VersionRange)> {
        let Some(&idx) = self.index.get(location) else {
            return Vec::new();
        };
        let mut out: Vec<(&Package, &VersionRange)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (&self.graph[other], e.weight())
            })
            .collect();
        out.sort_by(|a, b| a.0.location().cmp(b.0.location()));
        out
    }

    /// Every module of every package, with its owning package.
    pub fn modules(&self) -> impl Iterator<Item = (&Package, &Module)> {
        self.packages()
            .flat_map(|package| package.modules.iter().map(move |m| (package, m)))
    }

    /// Packages ordered so that every package follows its dependencies.
    pub fn build_order(&self) -> Vec<&Package> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(order) => order.into_iter().rev().map(|idx| &self.graph[idx]).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Find the chain of packages from the root to a dependency.
    ///
    /// Accepts either a location or a package name.
    pub fn find_path(&self, key: &str) -> Option<Vec<&Package>> {
        let target = self.resolve_key(key)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(self.root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    /// Exact location first, then the first package whose name matches.
    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some(&idx) = self.index.get(key) {
            return Some(idx);
        }
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].name() == key)
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Render the dependency tree under the root.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = format!("{}\n", label(self.root()));
        let mut visited = HashSet::new();
        visited.insert(self.root);

        let deps = self.children(self.root);
        let count = deps.len();
        for (i, child) in deps.into_iter().enumerate() {
            self.print_subtree(&mut output, child, "", i == count - 1, 1, max_depth, &mut visited);
        }
        output
    }

    fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        children.sort_by(|a, b| self.graph[*a].location().cmp(self.graph[*b].location()));
        children.dedup();
        children
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", label(&self.graph[idx])));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Number of packages, including the root.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

fn label(package: &Package) -> String {
    match &package.version {
        Some(version) => format!("{} v{version} ({})", package.name(), package.location()),
        None => format!("{} ({})", package.name(), package.location()),
    }
}

/// The first cycle found through one of `preferred`, falling back to any
/// node of the graph. Empty for an acyclic graph.
pub(crate) fn cycle_path<N, E>(graph: &DiGraph<N, E>, preferred: &[NodeIndex]) -> Vec<NodeIndex> {
    preferred
        .iter()
        .copied()
        .chain(graph.node_indices())
        .map(|start| find_cycle(graph, start))
        .find(|path| !path.is_empty())
        .unwrap_or_default()
}

/// A cycle through `start` as `[start, .., start]`, or empty if `start` is
/// not on a cycle.
pub(crate) fn find_cycle<N, E>(graph: &DiGraph<N, E>, start: NodeIndex) -> Vec<NodeIndex> {
    fn walk<N, E>(
        graph: &DiGraph<N, E>,
        current: NodeIndex,
        start: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        for next in graph.neighbors(current) {
            if next == start {
                path.push(next);
                return true;
            }
            if visited.insert(next) {
                path.push(next);
                if walk(graph, next, start, path, visited) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    let mut path = vec![start];
    let mut visited = HashSet::new();
    visited.insert(start);
    if walk(graph, start, start, &mut path, &mut visited) {
        path
    } else {
        Vec::new()
    }
}
