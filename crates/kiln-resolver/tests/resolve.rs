use std::collections::HashSet;
use std::path::PathBuf;

use kiln_core::constraint::ConstraintSet;
use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::dependency::Dependency;
use kiln_core::manifest::Manifest;
use kiln_core::module::Module;
use kiln_core::source::ModuleSource;
use kiln_core::version::Version;
use kiln_resolver::{resolve, ResolutionError};

const G: &str = "org.example";

fn module(name: &str, version: &str) -> Module {
    Module::new(Coordinate::new(G, name, version))
}

fn coord(name: &str, version: &str) -> Coordinate {
    Coordinate::new(G, name, version)
}

fn platform(name: &str) -> ConstraintSet {
    ConstraintSet::new(name, coord(name, "1.0.0"))
}

#[test]
fn extending_platform_recommendation_wins() {
    let sets = vec![
        platform("p1").recommend(G, "compress-core", "1.0.0"),
        platform("p2")
            .extending("p1")
            .recommend(G, "compress-core", "1.2.0"),
    ];
    let modules = vec![module("app", "1.0.0")
        .with_platform("p2")
        .with_dependency(Dependency::managed(G, "compress-core"))];

    let resolution = resolve(&modules, &sets).unwrap();
    assert_eq!(
        resolution.graph.dependencies_of(&coord("app", "1.0.0")),
        vec![coord("compress-core", "1.2.0")]
    );
    assert!(resolution.conflicts.is_empty());
}

#[test]
fn exact_versions_without_platform_conflict() {
    let modules = vec![
        module("a", "1.0.0").with_dependency(Dependency::exact(G, "lib", "1.0.0")),
        module("b", "1.0.0").with_dependency(Dependency::exact(G, "lib", "2.0.0")),
    ];
    let err = resolve(&modules, &[]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::VersionConflict {
            module: ModuleKey::new(G, "lib"),
            versions: vec![Version::parse("1.0.0"), Version::parse("2.0.0")],
        }
    );
}

#[test]
fn two_node_cycle_is_reported() {
    let modules = vec![
        module("a", "1").with_dependency(Dependency::exact(G, "b", "1")),
        module("b", "1").with_dependency(Dependency::exact(G, "a", "1")),
    ];
    let err = resolve(&modules, &[]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::CyclicDependency {
            cycle: vec![coord("a", "1"), coord("b", "1")],
        }
    );
}

#[test]
fn platform_in_scope_reconciles_exact_conflict() {
    let sets = vec![platform("bom").recommend(G, "lib", "2.0.0")];
    let modules = vec![
        module("a", "1.0.0")
            .with_platform("bom")
            .with_dependency(Dependency::exact(G, "lib", "1.0.0")),
        module("b", "1.0.0").with_dependency(Dependency::exact(G, "lib", "2.0.0")),
    ];

    let resolution = resolve(&modules, &sets).unwrap();
    let lib = coord("lib", "2.0.0");
    assert_eq!(resolution.graph.dependencies_of(&coord("a", "1.0.0")), vec![lib.clone()]);
    assert_eq!(resolution.graph.externals(), vec![lib]);
    assert_eq!(resolution.conflicts.len(), 1);
    let conflict = resolution.conflicts.iter().next().unwrap();
    assert_eq!(conflict.requested_by, coord("a", "1.0.0"));
    assert_eq!(conflict.requested, Version::parse("1.0.0"));
    assert_eq!(conflict.resolved, Version::parse("2.0.0"));
    assert_eq!(conflict.platform, "bom");
}

#[test]
fn platform_does_not_move_requesters_that_do_not_apply_it() {
    let sets = vec![platform("platform-v2").recommend(G, "lib", "2.0.0")];
    let modules = vec![
        module("v1-app", "1.0.0").with_dependency(Dependency::exact(G, "lib", "1.0.0")),
        module("v2-app", "2.0.0")
            .with_platform("platform-v2")
            .with_dependency(Dependency::exact(G, "lib", "1.5.0")),
    ];
    let err = resolve(&modules, &sets).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::VersionConflict {
            module: ModuleKey::new(G, "lib"),
            versions: vec![Version::parse("1.0.0"), Version::parse("1.5.0")],
        }
    );
}

#[test]
fn unrelated_platform_lines_stay_in_conflict() {
    let sets = vec![
        platform("platform-v1").recommend(G, "lib", "1.0.0"),
        platform("platform-v2").recommend(G, "lib", "2.0.0"),
    ];
    let modules = vec![
        module("v1-app", "1.0.0")
            .with_platform("platform-v1")
            .with_dependency(Dependency::exact(G, "lib", "1.1.0")),
        module("v2-app", "2.0.0")
            .with_platform("platform-v2")
            .with_dependency(Dependency::exact(G, "lib", "2.1.0")),
    ];
    assert!(matches!(
        resolve(&modules, &sets),
        Err(ResolutionError::VersionConflict { .. })
    ));
}

#[test]
fn extending_platform_moves_requesters_of_its_parent() {
    let sets = vec![
        platform("platform-v1").recommend(G, "lib", "1.0.0"),
        platform("platform-v2")
            .extending("platform-v1")
            .recommend(G, "lib", "2.0.0"),
    ];
    let modules = vec![
        module("v1-app", "1.0.0")
            .with_platform("platform-v1")
            .with_dependency(Dependency::exact(G, "lib", "1.1.0")),
        module("v2-app", "2.0.0")
            .with_platform("platform-v2")
            .with_dependency(Dependency::exact(G, "lib", "2.1.0")),
    ];
    let resolution = resolve(&modules, &sets).unwrap();
    assert_eq!(resolution.graph.externals(), vec![coord("lib", "2.0.0")]);
    let moved: Vec<&Coordinate> = resolution.conflicts.iter().map(|c| &c.requested_by).collect();
    assert_eq!(moved, vec![&coord("v1-app", "1.0.0"), &coord("v2-app", "2.0.0")]);
}

#[test]
fn recommendation_outside_requested_versions_is_used() {
    let sets = vec![platform("bom").recommend(G, "lib", "1.5.0")];
    let modules = vec![
        module("a", "1.0.0")
            .with_platform("bom")
            .with_dependency(Dependency::exact(G, "lib", "1.0.0")),
        module("b", "1.0.0")
            .with_platform("bom")
            .with_dependency(Dependency::exact(G, "lib", "2.0.0")),
    ];
    let resolution = resolve(&modules, &sets).unwrap();
    assert_eq!(resolution.graph.externals(), vec![coord("lib", "1.5.0")]);
    assert_eq!(resolution.conflicts.len(), 2);
}

#[test]
fn platforms_out_of_scope_are_ignored() {
    let sets = vec![platform("unused").recommend(G, "lib", "2.0.0")];
    let modules = vec![
        module("a", "1").with_dependency(Dependency::exact(G, "lib", "1.0.0")),
        module("b", "1").with_dependency(Dependency::exact(G, "lib", "2.0.0")),
    ];
    assert!(matches!(
        resolve(&modules, &sets),
        Err(ResolutionError::VersionConflict { .. })
    ));
}

#[test]
fn managed_dependency_without_platform_is_unresolved() {
    let modules = vec![module("app", "1").with_dependency(Dependency::managed(G, "lib"))];
    let err = resolve(&modules, &[]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::UnresolvedVersion {
            module: ModuleKey::new(G, "lib"),
            requested_by: coord("app", "1"),
        }
    );
}

#[test]
fn managed_dependency_missing_from_platform_is_unresolved() {
    let sets = vec![platform("bom").recommend(G, "other", "1")];
    let modules = vec![module("app", "1")
        .with_platform("bom")
        .with_dependency(Dependency::managed(G, "lib"))];
    assert!(matches!(
        resolve(&modules, &sets),
        Err(ResolutionError::UnresolvedVersion { .. })
    ));
}

#[test]
fn dependency_level_platform_overrides_module_platform() {
    let sets = vec![
        platform("v1").recommend(G, "lib", "1.0"),
        platform("v2").recommend(G, "lib", "2.0"),
    ];
    let modules = vec![module("app", "1")
        .with_platform("v2")
        .with_dependency(Dependency::managed_by(G, "lib", "v1"))];
    let resolution = resolve(&modules, &sets).unwrap();
    assert_eq!(
        resolution.graph.dependencies_of(&coord("app", "1")),
        vec![coord("lib", "1.0")]
    );
}

#[test]
fn unknown_platform_reference_is_rejected() {
    let modules = vec![module("app", "1").with_platform("ghost")];
    let err = resolve(&modules, &[]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::UnknownConstraintSet {
            name: "ghost".into(),
            referenced_by: "module org.example:app:1".into(),
        }
    );
}

#[test]
fn duplicate_module_is_rejected() {
    let modules = vec![module("a", "1.0"), module("a", "1.0.0")];
    assert!(matches!(
        resolve(&modules, &[]),
        Err(ResolutionError::DuplicateModule { .. })
    ));
}

#[test]
fn unknown_project_reference_is_rejected() {
    let modules = vec![module("app", "1").with_dependency(Dependency::project("nowhere"))];
    assert!(matches!(
        resolve(&modules, &[]),
        Err(ResolutionError::UnknownModule { module, .. }) if module == "nowhere"
    ));
}

#[test]
fn coexisting_major_versions_are_independent_nodes() {
    let modules = vec![
        module("core", "1.0.0"),
        module("core", "2.0.0"),
        module("util", "1.0.0").with_dependency(Dependency::project("core")),
        module("util", "2.0.0").with_dependency(Dependency::project("core")),
    ];
    let resolution = resolve(&modules, &[]).unwrap();
    let graph = &resolution.graph;
    assert_eq!(graph.local_modules().len(), 4);
    assert_eq!(
        graph.dependencies_of(&coord("util", "1.0.0")),
        vec![coord("core", "1.0.0")]
    );
    assert_eq!(
        graph.dependencies_of(&coord("util", "2.0.0")),
        vec![coord("core", "2.0.0")]
    );
}

#[test]
fn every_edge_targets_a_single_version() {
    let sets = vec![platform("bom").recommend(G, "lib", "3")];
    let modules = vec![
        module("a", "1")
            .with_platform("bom")
            .with_dependency(Dependency::exact(G, "lib", "1"))
            .with_dependency(Dependency::exact(G, "lib", "2")),
        module("b", "1")
            .with_dependency(Dependency::project("a"))
            .with_dependency(Dependency::exact(G, "lib", "3")),
    ];
    let resolution = resolve(&modules, &sets).unwrap();
    let graph = &resolution.graph;
    for node in graph.nodes() {
        let deps = graph.dependencies_of(&node);
        let keys: HashSet<ModuleKey> = deps.iter().map(|c| c.key()).collect();
        assert_eq!(keys.len(), deps.len(), "{node} has duplicate module targets");
    }
    assert_eq!(graph.dependencies_of(&coord("a", "1")), vec![coord("lib", "3")]);
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
}

#[test]
fn multi_version_fixture_resolves() {
    let manifest = Manifest::from_path(&fixtures_dir().join("multi-version.toml")).unwrap();
    let decls = manifest.load().unwrap();
    let resolution = resolve(&decls.modules, &decls.constraint_sets).unwrap();
    let graph = &resolution.graph;

    let app = Coordinate::new("org.example.apps", "app", "2.0.0");
    assert_eq!(
        graph.dependencies_of(&app),
        vec![
            coord("core", "2.0.0"),
            Coordinate::new("com.google.guava", "guava", "33.0-jre"),
            coord("util", "1.0.0"),
        ]
    );
    assert_eq!(
        graph.dependencies_of(&coord("util", "1.0.0")),
        vec![coord("core", "1.0.0")]
    );
    assert_eq!(
        graph.externals(),
        vec![Coordinate::new("com.google.guava", "guava", "33.0-jre")]
    );
    assert_eq!(graph.roots(), vec![coord("core", "1.1.0"), app]);
}
