//! The loaded workspace every operation works against.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_core::config::GlobalConfig;
use kiln_core::manifest::Manifest;
use kiln_core::module::Module;
use kiln_core::repository::Repository;
use kiln_core::source::{Declarations, ModuleSource};
use kiln_resolver::Resolution;
use kiln_util::errors::KilnError;
use kiln_util::fs::find_ancestor_with;

use crate::inputs;

pub const MANIFEST_FILE: &str = "Kiln.toml";
pub const LOCK_FILE: &str = "Kiln.lock";
/// Workspace-local state: fingerprints and build outputs.
pub const STATE_DIR: &str = ".kiln";

pub struct WorkspaceContext {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub config: GlobalConfig,
    /// Declarations with input digests filled in.
    pub declarations: Declarations,
    /// Manifest repositories plus global defaults the manifest does not override.
    pub repositories: BTreeMap<String, Repository>,
}

impl WorkspaceContext {
    /// Locate and load the workspace.
    ///
    /// With an explicit `manifest_path` that file is used; otherwise
    /// `Kiln.toml` is searched for from `cwd` upwards.
    pub fn load(
        manifest_path: Option<&Path>,
        cwd: &Path,
        config: GlobalConfig,
    ) -> miette::Result<Self> {
        let manifest_path = match manifest_path {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => {
                return Err(KilnError::Manifest {
                    message: format!("{} does not exist", path.display()),
                }
                .into())
            }
            None => find_ancestor_with(cwd, MANIFEST_FILE)
                .map(|dir| dir.join(MANIFEST_FILE))
                .ok_or_else(|| KilnError::Manifest {
                    message: format!(
                        "Could not find {MANIFEST_FILE} in {} or any parent directory",
                        cwd.display()
                    ),
                })?,
        };
        let root = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());

        let manifest = Manifest::from_path(&manifest_path)?;
        let mut declarations = manifest.load()?;
        for module in &mut declarations.modules {
            let exclude = inputs::exclusions(&manifest.workspace.exclude, module)?;
            let dir = root.join(module_dir(module));
            module.inputs_digest = inputs::digest(&dir, &exclude);
        }

        let mut repositories: BTreeMap<String, Repository> = config
            .repositories
            .iter()
            .map(|(name, url)| (name.clone(), Repository::new(name, url)))
            .collect();
        for (name, entry) in &manifest.repositories {
            repositories.insert(name.clone(), Repository::from_entry(name, entry));
        }

        tracing::info!(
            "loaded workspace {} ({} modules, {} platforms)",
            root.display(),
            declarations.modules.len(),
            declarations.constraint_sets.len()
        );
        Ok(Self {
            root,
            manifest,
            config,
            declarations,
            repositories,
        })
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn fingerprints_path(&self) -> PathBuf {
        self.state_dir().join("fingerprints.json")
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Root of the per-module scratch directories handed to build commands.
    pub fn output_root(&self) -> PathBuf {
        self.state_dir().join("out")
    }

    /// The publish destination: `name` if given, else `[workspace] publish`,
    /// else the only configured repository.
    pub fn publish_repository(&self, name: Option<&str>) -> miette::Result<Repository> {
        let wanted = name.or(self.manifest.workspace.publish.as_deref());
        match wanted {
            Some(name) => self.repositories.get(name).cloned().ok_or_else(|| {
                KilnError::Config {
                    message: format!("no repository named `{name}` is configured"),
                }
                .into()
            }),
            None => {
                let mut all = self.repositories.values();
                match (all.next(), all.next()) {
                    (Some(only), None) => Ok(only.clone()),
                    _ => Err(KilnError::Config {
                        message: format!(
                            "{} repositories configured; set `publish` in [workspace] or pass --repository",
                            self.repositories.len()
                        ),
                    }
                    .into()),
                }
            }
        }
    }

    /// Resolve the declared modules against the declared platforms.
    pub fn resolve(&self) -> miette::Result<Resolution> {
        let resolution = kiln_resolver::resolve(
            &self.declarations.modules,
            &self.declarations.constraint_sets,
        )?;
        Ok(resolution)
    }
}

/// A module's directory relative to the workspace root.
pub fn module_dir(module: &Module) -> PathBuf {
    module
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(&module.coordinate.name))
}
