//! Resolution of declared modules into a validated dependency graph.
//!
//! Platform-managed versions are expanded from flattened constraint sets,
//! project references are bound to declared modules, competing versions of
//! the same module are arbitrated by the platforms their requesters apply,
//! and the resulting graph must be acyclic.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use kiln_core::constraint::ConstraintSet;
use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::dependency::{Dependency, VersionSpec};
use kiln_core::module::Module;
use kiln_core::version::Version;

use crate::conflict::{ConflictReport, VersionConflict};
use crate::error::ResolutionError;
use crate::graph::{DepEdge, DependencyGraph, ResolvedGraph};
use crate::platform::Platforms;

/// The output of dependency resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub graph: ResolvedGraph,
    /// Requests that a platform moved to a different version.
    pub conflicts: ConflictReport,
}

/// Resolve declared modules against the declared constraint sets.
pub fn resolve(
    modules: &[Module],
    constraint_sets: &[ConstraintSet],
) -> Result<Resolution, ResolutionError> {
    let mut declared = HashSet::new();
    for module in modules {
        if !declared.insert(&module.coordinate) {
            return Err(ResolutionError::DuplicateModule {
                coordinate: module.coordinate.clone(),
            });
        }
    }

    let platforms = Platforms::new(constraint_sets)?;
    check_platform_references(modules, &platforms)?;

    let mut edges: Vec<(&Coordinate, Coordinate, DepEdge)> = Vec::new();
    let mut requests: BTreeMap<ModuleKey, Vec<Request<'_>>> = BTreeMap::new();
    for module in modules {
        for dep in &module.dependencies {
            match dep {
                Dependency::Coordinate { key, version: spec } => {
                    let version = expand(module, key, spec, &platforms)?;
                    tracing::debug!("{} requests {key}:{version}", module.coordinate);
                    requests.entry(key.clone()).or_default().push(Request {
                        from: &module.coordinate,
                        version: version.clone(),
                        platforms: applicable_platforms(module, spec),
                    });
                    edges.push((&module.coordinate, key.at(version), DepEdge::Requested));
                }
                Dependency::Project { name, group } => {
                    let target = bind_project(module, name, group.as_deref(), modules)?;
                    tracing::debug!("{} binds project {name} to {target}", module.coordinate);
                    edges.push((&module.coordinate, target.clone(), DepEdge::Project));
                }
            }
        }
    }

    let mut chosen = BTreeMap::new();
    let mut conflicts = ConflictReport::new();
    for (key, requests) in &requests {
        let versions: BTreeSet<&Version> = requests.iter().map(|r| &r.version).collect();
        if versions.len() < 2 {
            continue;
        }
        let Some((version, moved)) = reconcile(key, requests, &platforms) else {
            return Err(ResolutionError::VersionConflict {
                module: key.clone(),
                versions: versions.into_iter().cloned().collect(),
            });
        };
        tracing::debug!("{key}: reconciled to {version}");
        conflicts.extend(moved);
        chosen.insert(key.clone(), version);
    }

    let mut graph = DependencyGraph::new();
    for module in modules {
        graph.add_module(module.clone());
    }
    for (from, to, kind) in &edges {
        if !graph.contains(to) {
            graph.add_external(to.clone());
        }
        graph.add_edge(from, to, *kind)?;
    }
    let graph = graph.collapse(&chosen);

    if let Some(cycle) = graph.find_cycle() {
        return Err(ResolutionError::CyclicDependency { cycle });
    }

    tracing::info!(
        "resolved {} modules ({} external, {} conflicts reconciled)",
        graph.len(),
        graph.externals().len(),
        conflicts.len()
    );
    Ok(Resolution {
        graph: ResolvedGraph::new(graph),
        conflicts,
    })
}

/// A dependency request on a module by coordinate, after managed versions are expanded.
struct Request<'m> {
    from: &'m Coordinate,
    version: Version,
    /// Platforms the requester applies to this dependency.
    platforms: Vec<&'m str>,
}

/// Reject platform names that no constraint set declares.
fn check_platform_references(
    modules: &[Module],
    platforms: &Platforms<'_>,
) -> Result<(), ResolutionError> {
    for module in modules {
        let per_dependency = module.dependencies.iter().filter_map(|dep| match dep {
            Dependency::Coordinate { version, .. } => dependency_platform(version),
            Dependency::Project { .. } => None,
        });
        if let Some(name) = module
            .platform
            .as_deref()
            .into_iter()
            .chain(per_dependency)
            .find(|name| !platforms.contains(name))
        {
            return Err(ResolutionError::UnknownConstraintSet {
                name: name.to_string(),
                referenced_by: format!("module {}", module.coordinate),
            });
        }
    }
    Ok(())
}

fn dependency_platform(spec: &VersionSpec) -> Option<&str> {
    match spec {
        VersionSpec::Managed { platform } => platform.as_deref(),
        VersionSpec::Exact(_) => None,
    }
}

fn applicable_platforms<'m>(module: &'m Module, spec: &'m VersionSpec) -> Vec<&'m str> {
    module
        .platform
        .as_deref()
        .into_iter()
        .chain(dependency_platform(spec))
        .collect()
}

/// Settle a module requested at several versions on one of them.
///
/// The platforms applied by all requesters arbitrate a single pick. A request
/// may only be moved to it when the winning platform is one its requester
/// applies, an ancestor of one, or a set extending one. Returns `None` when
/// no pick exists or some request cannot be moved.
fn reconcile(
    key: &ModuleKey,
    requests: &[Request<'_>],
    platforms: &Platforms<'_>,
) -> Option<(Version, Vec<VersionConflict>)> {
    let scope = platforms.in_scope(requests.iter().flat_map(|r| r.platforms.iter().copied()));
    let (platform, version) = platforms.arbitrate(&scope, key)?;

    let applies = |r: &Request<'_>| {
        r.platforms.iter().any(|&p| {
            p == platform || platforms.extends(p, platform) || platforms.extends(platform, p)
        })
    };
    if let Some(pin) = requests
        .iter()
        .find(|r| r.version != version && !applies(*r))
    {
        tracing::debug!(
            "{key}: {} pins {} outside platform `{platform}`",
            pin.from,
            pin.version
        );
        return None;
    }

    let moved = requests
        .iter()
        .filter(|r| r.version != version)
        .map(|r| VersionConflict {
            module: key.clone(),
            requested_by: r.from.clone(),
            requested: r.version.clone(),
            resolved: version.clone(),
            platform: platform.to_string(),
        })
        .collect();
    Some((version, moved))
}

fn expand(
    module: &Module,
    key: &ModuleKey,
    spec: &VersionSpec,
    platforms: &Platforms<'_>,
) -> Result<Version, ResolutionError> {
    match spec {
        VersionSpec::Exact(version) => Ok(version.clone()),
        VersionSpec::Managed { platform } => platform
            .as_deref()
            .or(module.platform.as_deref())
            .and_then(|p| platforms.recommendation(p, key))
            .cloned()
            .ok_or_else(|| ResolutionError::UnresolvedVersion {
                module: key.clone(),
                requested_by: module.coordinate.clone(),
            }),
    }
}

/// Bind a project reference to exactly one declared module.
///
/// Among modules with the referenced name (and group, if given), the one
/// sharing the requester's group and version wins; otherwise the reference
/// must be unambiguous.
fn bind_project<'m>(
    requester: &Module,
    name: &str,
    group: Option<&str>,
    modules: &'m [Module],
) -> Result<&'m Coordinate, ResolutionError> {
    let from = &requester.coordinate;
    let candidates: Vec<&Coordinate> = modules
        .iter()
        .map(|m| &m.coordinate)
        .filter(|c| c.name == name && group.map_or(true, |g| c.group == g))
        .collect();

    if let Some(same_line) = candidates
        .iter()
        .find(|c| c.group == from.group && c.version == from.version)
    {
        return Ok(*same_line);
    }

    match candidates.as_slice() {
        [] => Err(ResolutionError::UnknownModule {
            module: group.map_or_else(|| name.to_string(), |g| format!("{g}:{name}")),
            requested_by: Some(from.clone()),
        }),
        [only] => Ok(*only),
        many => {
            let mut versions: Vec<Version> = many.iter().map(|c| c.version.clone()).collect();
            versions.sort();
            versions.dedup();
            Err(ResolutionError::VersionConflict {
                module: many[0].key(),
                versions,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, version: &str) -> Module {
        Module::new(Coordinate::new("org.example", name, version))
    }

    #[test]
    fn project_reference_prefers_same_version_line() {
        let modules = vec![
            module("core", "1.0.0"),
            module("core", "2.0.0"),
            module("util", "2.0.0").with_dependency(Dependency::project("core")),
        ];
        let bound = bind_project(&modules[2], "core", None, &modules).unwrap();
        assert_eq!(bound, &Coordinate::new("org.example", "core", "2.0.0"));
    }

    #[test]
    fn ambiguous_project_reference_is_a_conflict() {
        let modules = vec![
            module("core", "1.0.0"),
            module("core", "2.0.0"),
            module("app", "3.0.0"),
        ];
        let err = bind_project(&modules[2], "core", None, &modules).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::VersionConflict {
                module: ModuleKey::new("org.example", "core"),
                versions: vec![Version::parse("1.0.0"), Version::parse("2.0.0")],
            }
        );
    }

    #[test]
    fn single_candidate_binds_across_versions() {
        let modules = vec![module("core", "1.0.0"), module("app", "3.0.0")];
        let bound = bind_project(&modules[1], "core", Some("org.example"), &modules).unwrap();
        assert_eq!(bound.version, Version::parse("1.0.0"));
        assert!(bind_project(&modules[1], "core", Some("other"), &modules).is_err());
    }
}
