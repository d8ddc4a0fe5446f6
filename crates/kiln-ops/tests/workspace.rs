use std::fs;
use std::path::Path;

use kiln_core::config::GlobalConfig;
use kiln_core::coordinate::Coordinate;
use kiln_core::lockfile::Lockfile;
use kiln_ops::ops_build::{self, BuildOptions};
use kiln_ops::ops_clean::{self, CleanResult};
use kiln_ops::ops_tree::{self, TreeOptions};
use kiln_ops::{ops_lock, ops_plan, WorkspaceContext};
use kiln_repository::FileRepository;
use kiln_scheduler::{BuildOutcome, ModuleStatus};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[workspace]
group = "org.example"
version = "1.0.0"
publish = "local"
build = "mkdir -p build && echo \"$KILN_MODULE $KILN_VERSION\" > build/$KILN_MODULE.jar"

[repositories]
local = "repo"

[[module]]
name = "core"
path = "v1/core"
artifacts = ["build/core.jar"]

[[module]]
name = "core"
version = "2.0.0"
path = "v2/core"
artifacts = ["build/core.jar"]

[[module]]
name = "util"
version = "2.0.0"
path = "v2/util"
platform = "platform-v2"
artifacts = ["build/util.jar"]
dependencies = ["org.example:core"]

[[platform]]
name = "platform-v2"
version = "2.0.0"
constraints = { "org.example:core" = "2.0.0" }
"#;

fn workspace(manifest: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Kiln.toml"), manifest).unwrap();
    for dir in ["v1/core", "v2/core", "v2/util"] {
        fs::create_dir_all(tmp.path().join(dir).join("src")).unwrap();
        fs::write(tmp.path().join(dir).join("src/lib.txt"), dir).unwrap();
    }
    tmp
}

fn load(root: &Path) -> WorkspaceContext {
    WorkspaceContext::load(None, root, GlobalConfig::default()).unwrap()
}

fn coord(name: &str, version: &str) -> Coordinate {
    Coordinate::new("org.example", name, version)
}

#[test]
fn context_is_found_from_a_subdirectory() {
    let tmp = workspace(MANIFEST);
    let ctx = load(&tmp.path().join("v2/util/src"));
    assert_eq!(ctx.root, tmp.path());
    assert_eq!(ctx.declarations.modules.len(), 3);
    assert!(ctx
        .declarations
        .modules
        .iter()
        .all(|m| m.inputs_digest.is_some()));
    assert_eq!(ctx.publish_repository(None).unwrap().name, "local");
}

#[test]
fn missing_manifest_is_reported() {
    let tmp = TempDir::new().unwrap();
    let err = WorkspaceContext::load(None, tmp.path(), GlobalConfig::default())
        .err()
        .unwrap();
    assert!(err.to_string().contains("Kiln.toml"));
}

#[test]
fn global_repositories_fill_in_but_do_not_override() {
    let tmp = workspace(MANIFEST);
    let mut config = GlobalConfig::default();
    config
        .repositories
        .insert("local".into(), "/elsewhere".into());
    config
        .repositories
        .insert("shared".into(), "/srv/shared".into());
    let ctx = WorkspaceContext::load(None, tmp.path(), config).unwrap();
    assert_eq!(ctx.repositories["local"].url, "repo");
    assert_eq!(ctx.repositories["shared"].url, "/srv/shared");
    assert!(ctx.publish_repository(Some("missing")).is_err());
}

#[test]
fn plan_orders_dependencies_first() {
    let tmp = workspace(MANIFEST);
    let plan = ops_plan::plan_build(&load(tmp.path())).unwrap();
    let order: Vec<String> = plan.order().iter().map(|c| c.to_string()).collect();
    assert_eq!(
        order,
        vec![
            "org.example:core:1.0.0",
            "org.example:core:2.0.0",
            "org.example:util:2.0.0",
        ]
    );
}

#[test]
fn tree_views() {
    let tmp = workspace(MANIFEST);
    let ctx = load(tmp.path());

    let full = ops_tree::tree(&ctx, &TreeOptions::default()).unwrap();
    assert!(full.contains("org.example:util:2.0.0"));
    assert!(full.contains("└── org.example:core:2.0.0"));

    let why = ops_tree::tree(
        &ctx,
        &TreeOptions {
            why: Some("org.example:core:2.0.0".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(why, "org.example:util:2.0.0\n  org.example:core:2.0.0\n");

    let inverted = ops_tree::tree(
        &ctx,
        &TreeOptions {
            inverted: Some("org.example:core:2.0.0".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(inverted.starts_with("org.example:core:2.0.0\n"));
    assert!(inverted.contains("org.example:util:2.0.0"));

    let conflicts = ops_tree::tree(
        &ctx,
        &TreeOptions {
            conflicts: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(conflicts, "No version conflicts.\n");

    assert!(ops_tree::tree(
        &ctx,
        &TreeOptions {
            why: Some("ghost".into()),
            ..Default::default()
        },
    )
    .is_err());
}

#[test]
fn lock_records_the_resolved_graph() {
    let tmp = workspace(MANIFEST);
    let ctx = load(tmp.path());
    ops_lock::lock(&ctx).unwrap();

    let lockfile = Lockfile::from_path(&tmp.path().join("Kiln.lock")).unwrap();
    assert_eq!(lockfile.package.len(), 3);
    let util = lockfile.find(&coord("util", "2.0.0")).unwrap();
    assert_eq!(util.source, "workspace");
    assert_eq!(util.dependencies, vec!["org.example:core:2.0.0"]);
}

#[tokio::test]
async fn build_byproducts_beside_artifacts_keep_modules_fresh() {
    let manifest = MANIFEST.replace(
        "> build/$KILN_MODULE.jar\"",
        "> build/$KILN_MODULE.jar && mkdir -p build/classes && echo scratch > build/classes/stamp\"",
    );
    let tmp = workspace(&manifest);

    let first = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap();
    assert_eq!(first.outcome, BuildOutcome::Success);
    assert!(tmp.path().join("v2/util/build/classes/stamp").is_file());

    let second = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap();
    assert!(second
        .statuses
        .values()
        .all(|s| *s == ModuleStatus::UpToDate));
}

#[tokio::test]
async fn build_publishes_then_reuses_fingerprints() {
    let tmp = workspace(MANIFEST);
    let ctx = load(tmp.path());

    let first = ops_build::build(&ctx, &BuildOptions::default()).await.unwrap();
    assert_eq!(first.outcome, BuildOutcome::Success);

    let repo = FileRepository::new(tmp.path().join("repo"));
    for c in [coord("core", "1.0.0"), coord("core", "2.0.0"), coord("util", "2.0.0")] {
        assert!(repo.exists(&c), "{c} was not published");
    }
    assert!(repo.exists(&coord("platform-v2", "2.0.0")));
    let util = repo.fetch(&coord("util", "2.0.0")).unwrap().unwrap();
    assert_eq!(util.dependencies, vec![coord("core", "2.0.0")]);
    assert_eq!(
        fs::read_to_string(&util.files[0].path).unwrap().trim(),
        "util 2.0.0"
    );
    assert!(tmp.path().join("Kiln.lock").is_file());
    assert!(tmp.path().join(".kiln/fingerprints.json").is_file());

    // Nothing changed: everything is fresh.
    let second = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap();
    assert!(second
        .statuses
        .values()
        .all(|s| *s == ModuleStatus::UpToDate));

    // Editing core 2.0.0 rebuilds it and its dependent only.
    fs::write(tmp.path().join("v2/core/src/lib.txt"), "changed").unwrap();
    let third = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap();
    assert_eq!(
        third.status(&coord("core", "1.0.0")),
        Some(&ModuleStatus::UpToDate)
    );
    assert!(matches!(
        third.status(&coord("util", "2.0.0")),
        Some(ModuleStatus::Published(_))
    ));

    // --force ignores fingerprints.
    let forced = ops_build::build(
        &load(tmp.path()),
        &BuildOptions {
            force: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(forced
        .statuses
        .values()
        .all(|s| matches!(s, ModuleStatus::Published(_))));
}

#[tokio::test]
async fn failed_module_fails_the_build_and_skips_dependents() {
    let manifest = MANIFEST.replace(
        "path = \"v2/core\"",
        "path = \"v2/core\"\nbuild = \"echo core is broken >&2; exit 1\"",
    );
    let tmp = workspace(&manifest);
    let err = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("2 of 3 modules did not build"), "{err}");

    let repo = FileRepository::new(tmp.path().join("repo"));
    assert!(repo.exists(&coord("core", "1.0.0")));
    assert!(!repo.exists(&coord("util", "2.0.0")));
}

#[tokio::test]
async fn missing_external_dependency_stops_the_build() {
    let manifest = MANIFEST.replace(
        "dependencies = [\"org.example:core\"]",
        "dependencies = [\"org.example:core\", \"com.acme:zip:1.0\"]",
    );
    let tmp = workspace(&manifest);
    let err = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("com.acme:zip:1.0"), "{err}");
}

#[tokio::test]
async fn resolution_errors_surface_before_building() {
    let manifest = MANIFEST.replace(
        "path = \"v2/core\"",
        "path = \"v2/core\"\ndependencies = [\"org.example:util:2.0.0\"]",
    );
    let tmp = workspace(&manifest);
    let err = ops_build::build(&load(tmp.path()), &BuildOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("dependency cycle"), "{err}");
    assert!(!tmp.path().join("repo").exists());
    assert!(!tmp.path().join("Kiln.lock").exists());
}

#[tokio::test]
async fn clean_removes_state_but_keeps_published_artifacts() {
    let tmp = workspace(MANIFEST);
    let ctx = load(tmp.path());
    assert_eq!(ops_clean::clean(&ctx).unwrap(), CleanResult::NothingToClean);

    ops_build::build(&ctx, &BuildOptions::default()).await.unwrap();
    assert_eq!(ops_clean::clean(&ctx).unwrap(), CleanResult::Cleaned);
    assert!(!tmp.path().join(".kiln").exists());
    assert!(tmp.path().join("repo").is_dir());
}
