use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::dependency::{Dependency, VersionSpec};
use kiln_core::manifest::{Manifest, RepositoryEntry};
use kiln_core::source::ModuleSource;
use kiln_core::version::Version;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
}

#[test]
fn test_parse_multi_version_fixture() {
    let manifest = Manifest::from_path(&fixtures_dir().join("multi-version.toml")).unwrap();
    assert_eq!(manifest.workspace.group.as_deref(), Some("org.example"));
    assert_eq!(manifest.workspace.publish.as_deref(), Some("local"));
    assert_eq!(manifest.modules.len(), 5);
    assert_eq!(manifest.platforms.len(), 2);
    assert_eq!(manifest.repositories.len(), 2);
}

#[test]
fn test_declarations_apply_workspace_defaults() {
    let manifest = Manifest::from_path(&fixtures_dir().join("multi-version.toml")).unwrap();
    let decls = manifest.load().unwrap();

    let coords: Vec<String> = decls
        .modules
        .iter()
        .map(|m| m.coordinate.to_string())
        .collect();
    assert_eq!(
        coords,
        vec![
            "org.example:core:1.0.0",
            "org.example:util:1.0.0",
            "org.example:core:1.1.0",
            "org.example:core:2.0.0",
            "org.example.apps:app:2.0.0",
        ]
    );

    let core = &decls.modules[0];
    assert_eq!(core.path, Some(PathBuf::from("v1/core")));
    assert_eq!(core.outputs.len(), 2);
    assert_eq!(core.outputs[0].extension, "jar");
    assert_eq!(core.outputs[1].classifier.as_deref(), Some("sources"));

    let app = &decls.modules[4];
    assert_eq!(app.build.as_deref(), Some("make dist"));
    assert_eq!(app.platform.as_deref(), Some("platform-v2"));
    assert_eq!(app.path, Some(PathBuf::from("app")));
}

#[test]
fn test_dependency_forms() {
    let manifest = Manifest::from_path(&fixtures_dir().join("multi-version.toml")).unwrap();
    let decls = manifest.declarations().unwrap();

    assert_eq!(decls.modules[1].dependencies, vec![Dependency::project("core")]);
    assert_eq!(
        decls.modules[2].dependencies,
        vec![Dependency::exact("org.example", "util", "1.0.0")]
    );

    let app = &decls.modules[4];
    assert_eq!(app.dependencies[0], Dependency::managed("org.example", "core"));
    assert_eq!(
        app.dependencies[1],
        Dependency::exact("com.google.guava", "guava", "33.0-jre")
    );
    assert_eq!(
        app.dependencies[2],
        Dependency::Coordinate {
            key: ModuleKey::new("org.example", "util"),
            version: VersionSpec::Managed {
                platform: Some("platform-v1".to_string())
            },
        }
    );
}

#[test]
fn test_platforms_become_constraint_sets() {
    let manifest = Manifest::from_path(&fixtures_dir().join("multi-version.toml")).unwrap();
    let decls = manifest.declarations().unwrap();

    let v1 = &decls.constraint_sets[0];
    assert_eq!(v1.coordinate, Coordinate::new("org.example", "platform-v1", "1.0.0"));
    assert!(v1.extends.is_empty());
    assert_eq!(
        v1.recommendation(&ModuleKey::new("org.example", "core")),
        Some(&Version::parse("1.1.0"))
    );

    let v2 = &decls.constraint_sets[1];
    assert_eq!(v2.extends, vec!["platform-v1".to_string()]);
    assert_eq!(v2.recommendations.len(), 1);
}

#[test]
fn test_detailed_repository_entry() {
    let manifest = Manifest::from_path(&fixtures_dir().join("multi-version.toml")).unwrap();
    match &manifest.repositories["nexus"] {
        RepositoryEntry::Detailed { url, password, .. } => {
            assert_eq!(url, "https://nexus.example.com/releases/");
            assert_eq!(password.as_deref(), Some("secret"));
        }
        other => panic!("expected detailed entry, got {other:?}"),
    }
}

#[test]
fn test_env_file_interpolation() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".kiln.env"), "REPO_DIR=/srv/kiln-repo\n").unwrap();
    std::fs::write(
        dir.path().join("Kiln.toml"),
        r#"
[workspace]
group = "g"
version = "1"

[repositories]
local = "file://${env:REPO_DIR}"
"#,
    )
    .unwrap();

    let manifest = Manifest::from_path(&dir.path().join("Kiln.toml")).unwrap();
    match &manifest.repositories["local"] {
        RepositoryEntry::Url(url) => assert_eq!(url, "file:///srv/kiln-repo"),
        other => panic!("expected url entry, got {other:?}"),
    }
}

#[test]
fn test_missing_group_is_an_error() {
    let manifest = Manifest::parse_toml(
        r#"
[[module]]
name = "orphan"
version = "1.0"
"#,
    )
    .unwrap();
    let err = manifest.declarations().unwrap_err();
    assert!(err.to_string().contains("orphan"));
}

#[test]
fn test_bad_dependency_shorthand_is_an_error() {
    let manifest = Manifest::parse_toml(
        r#"
[workspace]
group = "g"
version = "1"

[[module]]
name = "m"
dependencies = ["not-a-coordinate"]
"#,
    )
    .unwrap();
    assert!(manifest.declarations().is_err());
}

#[test]
fn test_bad_constraint_key_is_an_error() {
    let manifest = Manifest::parse_toml(
        r#"
[workspace]
group = "g"
version = "1"

[[platform]]
name = "p"
constraints = { "missing-colon" = "1.0" }
"#,
    )
    .unwrap();
    assert!(manifest.declarations().is_err());
}

#[test]
fn test_invalid_toml_reports_manifest_error() {
    let err = Manifest::parse_toml("[[module]\nname=").unwrap_err();
    assert!(err.to_string().contains("Kiln.toml"));
}
