//! Core resolution algorithm: breadth-first constraint collection, range
//! intersection per location, highest-satisfying selection, repeated until
//! no selection changes.
//!
//! Each pass starts from the root manifest and walks the manifests of the
//! versions currently selected, so constraints contributed by a version that
//! was later replaced disappear on the next pass.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use miette::Diagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use pkgraph_core::manifest::{Manifest, ManifestError, ManifestLoader};
use pkgraph_core::version::{Version, VersionRange};
use thiserror::Error;

use crate::constraint::Requirements;
use crate::graph::cycle_path;
use crate::source::{FetchError, SourceControl};

/// Errors that abort a resolution attempt.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("no version of '{location}' satisfies every requirement: {constraints}")]
    #[diagnostic(
        code(pkgraph::resolve::unresolvable),
        help("relax one of the listed version requirements")
    )]
    UnresolvableConstraints {
        location: String,
        constraints: Requirements,
    },

    #[error("cyclic dependency: {path}")]
    #[diagnostic(code(pkgraph::resolve::cycle))]
    CyclicDependency { path: String },

    #[error("dependency resolution did not converge after {passes} passes")]
    #[diagnostic(code(pkgraph::resolve::non_convergent))]
    NonConvergent { passes: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to load the manifest of '{location}'")]
    #[diagnostic(code(pkgraph::resolve::manifest))]
    Manifest {
        location: String,
        #[source]
        source: ManifestError,
    },
}

/// One selected dependency.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub version: Version,
    /// The package's manifest with `version` attached.
    pub manifest: Manifest,
    /// Checkout root of the package.
    pub path: PathBuf,
    /// Every requirement that constrained the selection.
    pub requirements: Requirements,
}

/// A consumer → dependency edge, by location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub range: VersionRange,
}

/// The output of dependency resolution: one selected version for every
/// location reachable from the root.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub root: Manifest,
    pub packages: BTreeMap<String, ResolvedPackage>,
    pub edges: Vec<Edge>,
}

impl Resolution {
    pub fn get(&self, location: &str) -> Option<&ResolvedPackage> {
        self.packages.get(location)
    }

    pub fn version_of(&self, location: &str) -> Option<&Version> {
        self.packages.get(location).map(|p| &p.version)
    }
}

/// A version picked in a pass, with the manifest loaded from its checkout.
#[derive(Debug, Clone)]
struct Selection {
    version: Version,
    manifest: Manifest,
    path: PathBuf,
}

/// What one breadth-first walk over the current selections found.
struct Pass {
    constraints: BTreeMap<String, Requirements>,
    edges: Vec<Edge>,
}

/// Resolves the dependency graph of a root manifest.
///
/// A resolver holds no state between calls to [`Resolver::resolve`].
pub struct Resolver<'a> {
    source: &'a dyn SourceControl,
    loader: &'a dyn ManifestLoader,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn SourceControl, loader: &'a dyn ManifestLoader) -> Self {
        Self { source, loader }
    }

    /// Select one version for every location reachable from `root`.
    pub fn resolve(&self, root: &Manifest) -> Result<Resolution, ResolveError> {
        let mut session = Session::default();
        let mut selected: BTreeMap<String, Selection> = BTreeMap::new();
        let mut previous_ranges: BTreeMap<String, VersionRange> = BTreeMap::new();
        let mut seen_states: HashSet<Vec<(String, Version)>> = HashSet::new();
        let mut stalled = false;
        let mut passes = 0usize;

        loop {
            passes += 1;
            let pass = collect(root, &selected);
            tracing::debug!(
                "resolution pass {passes}: {} locations constrained",
                pass.constraints.len()
            );

            let mut next = BTreeMap::new();
            let mut ranges = BTreeMap::new();
            let mut tightened = false;

            for (location, requirements) in &pass.constraints {
                let Some(range) = requirements.combined() else {
                    continue;
                };
                tightened |= previous_ranges
                    .get(location)
                    .map_or(true, |prev| range.is_narrower_than(prev));

                let best = self.best_version(&mut session, location, &range, requirements)?;
                let selection = match selected.get(location) {
                    Some(current) if current.version == best => current.clone(),
                    _ => self.select(&mut session, location, best)?,
                };
                ranges.insert(location.clone(), range);
                next.insert(location.clone(), selection);
            }

            let changed = next.len() != selected.len()
                || next
                    .iter()
                    .any(|(loc, s)| selected.get(loc).map(|c| &c.version) != Some(&s.version));
            selected = next;

            if !changed {
                tracing::debug!("resolution converged after {passes} passes");
                check_cycles(root, &pass.edges)?;
                return Ok(finish(root, selected, pass));
            }

            let state: Vec<(String, Version)> = selected
                .iter()
                .map(|(loc, s)| (loc.clone(), s.version.clone()))
                .collect();
            // A changing pass without tightening is allowed once in a row.
            if !seen_states.insert(state) || (stalled && !tightened) {
                return Err(ResolveError::NonConvergent { passes });
            }
            stalled = !tightened;
            previous_ranges = ranges;
        }
    }

    fn best_version(
        &self,
        session: &mut Session,
        location: &str,
        range: &VersionRange,
        requirements: &Requirements,
    ) -> Result<Version, ResolveError> {
        let unresolvable = || ResolveError::UnresolvableConstraints {
            location: location.to_string(),
            constraints: requirements.clone(),
        };
        if range.is_empty() {
            return Err(unresolvable());
        }
        session
            .versions(self.source, location)?
            .iter()
            .filter(|v| range.contains(v))
            .max()
            .cloned()
            .ok_or_else(unresolvable)
    }

    fn select(
        &self,
        session: &mut Session,
        location: &str,
        version: Version,
    ) -> Result<Selection, ResolveError> {
        let key = (location.to_string(), version.clone());
        if let Some(selection) = session.loaded.get(&key) {
            return Ok(selection.clone());
        }

        tracing::info!("selected {location} {version}");
        let path = self.source.checkout(location, &version)?;
        let manifest = self
            .loader
            .load(&path, location)
            .map_err(|source| ResolveError::Manifest {
                location: location.to_string(),
                source,
            })?
            .with_version(version.clone());

        let selection = Selection {
            version,
            manifest,
            path,
        };
        session.loaded.insert(key, selection.clone());
        Ok(selection)
    }
}

/// Collaborator results memoized for one `resolve` call.
#[derive(Default)]
struct Session {
    versions: HashMap<String, Vec<Version>>,
    loaded: HashMap<(String, Version), Selection>,
}

impl Session {
    fn versions(
        &mut self,
        source: &dyn SourceControl,
        location: &str,
    ) -> Result<&[Version], FetchError> {
        if !self.versions.contains_key(location) {
            let available = source.available_versions(location)?;
            self.versions.insert(location.to_string(), available);
        }
        Ok(self
            .versions
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

/// Walk breadth-first from the root through the selected manifests,
/// recording every declared requirement and edge.
fn collect(root: &Manifest, selected: &BTreeMap<String, Selection>) -> Pass {
    let mut constraints: BTreeMap<String, Requirements> = BTreeMap::new();
    let mut edges = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&Manifest> = VecDeque::new();

    visited.insert(root.location.as_str());
    queue.push_back(root);

    while let Some(manifest) = queue.pop_front() {
        for dep in &manifest.dependencies {
            edges.push(Edge {
                from: manifest.location.clone(),
                to: dep.location.clone(),
                range: dep.range.clone(),
            });
            if dep.location == root.location {
                continue;
            }
            constraints
                .entry(dep.location.clone())
                .or_default()
                .add(manifest.location.clone(), dep.range.clone());

            if let Some(selection) = selected.get(&dep.location) {
                if visited.insert(dep.location.as_str()) {
                    queue.push_back(&selection.manifest);
                }
            }
        }
    }

    Pass { constraints, edges }
}

fn check_cycles(root: &Manifest, edges: &[Edge]) -> Result<(), ResolveError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    let root_idx = intern(&mut graph, &mut index, &root.location);
    for edge in edges {
        let from = intern(&mut graph, &mut index, &edge.from);
        let to = intern(&mut graph, &mut index, &edge.to);
        graph.update_edge(from, to, ());
    }

    if let Err(cycle) = petgraph::algo::toposort(&graph, None) {
        // Prefer reporting a cycle through the root when there is one.
        let path = cycle_path(&graph, &[root_idx, cycle.node_id()]);
        let names: Vec<&str> = path.into_iter().map(|idx| graph[idx]).collect();
        return Err(ResolveError::CyclicDependency {
            path: names.join(" -> "),
        });
    }
    Ok(())
}

fn intern<'a>(
    graph: &mut DiGraph<&'a str, ()>,
    index: &mut HashMap<&'a str, NodeIndex>,
    location: &'a str,
) -> NodeIndex {
    *index
        .entry(location)
        .or_insert_with(|| graph.add_node(location))
}

fn finish(root: &Manifest, selected: BTreeMap<String, Selection>, mut pass: Pass) -> Resolution {
    let packages = selected
        .into_iter()
        .map(|(location, selection)| {
            let requirements = pass.constraints.remove(&location).unwrap_or_default();
            let package = ResolvedPackage {
                version: selection.version,
                manifest: selection.manifest,
                path: selection.path,
                requirements,
            };
            (location, package)
        })
        .collect();

    Resolution {
        root: root.clone(),
        packages,
        edges: pass.edges,
    }
}
