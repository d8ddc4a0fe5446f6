use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_util::errors::KilnError;

use crate::constraint::ConstraintSet;
use crate::coordinate::{Coordinate, ModuleKey};
use crate::dependency::{Dependency, VersionSpec};
use crate::module::{ArtifactOutput, Module};
use crate::source::{Declarations, ModuleSource};
use crate::version::Version;

/// The parsed representation of a `Kiln.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,

    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,

    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformEntry>,
}

/// Workspace-wide defaults from the `[workspace]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Default group for modules and platforms that don't set one.
    #[serde(default)]
    pub group: Option<String>,
    /// Default version for modules and platforms that don't set one.
    #[serde(default)]
    pub version: Option<String>,
    /// Default build command for modules without their own.
    #[serde(default)]
    pub build: Option<String>,
    /// Name of the repository modules are published to.
    #[serde(default)]
    pub publish: Option<String>,
    /// Glob patterns excluded from module input digests.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A repository reference, either a URL string or a detailed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

/// One `[[module]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
    #[serde(default)]
    pub build: Option<String>,
}

/// A dependency specification inside a module.
///
/// Supports the shorthand `"group:name:version"`, the platform-managed
/// shorthand `"group:name"`, project references, and detailed tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyEntry {
    Short(String),
    Project {
        project: String,
        #[serde(default)]
        group: Option<String>,
    },
    Detailed {
        group: String,
        name: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        platform: Option<String>,
    },
}

/// A published output, either a path or a detailed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        classifier: Option<String>,
        #[serde(default)]
        extension: Option<String>,
    },
}

/// One `[[platform]]` table: a constraint set published as a BOM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub extends: Vec<String>,
    /// `"group:name" = "version"` recommendations.
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

impl Manifest {
    /// Load and parse a `Kiln.toml` file from the given path.
    ///
    /// Before parsing, `${env:VAR}` references in the manifest content are
    /// resolved using `.kiln.env` (if present alongside `Kiln.toml`) and
    /// process environment variables.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        tracing::debug!("loading manifest {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        let dir = path.parent().unwrap_or(Path::new("."));
        let env_vars =
            crate::properties::load_env_file(&dir.join(".kiln.env")).unwrap_or_default();
        let resolved = crate::properties::interpolate(&content, &env_vars);

        Self::parse_toml(&resolved)
    }

    /// Parse a `Kiln.toml` from a string (no interpolation).
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            KilnError::Manifest {
                message: format!("Failed to parse Kiln.toml: {e}"),
            }
            .into()
        })
    }

    /// Convert the manifest tables into resolver inputs.
    pub fn declarations(&self) -> miette::Result<Declarations> {
        let modules = self
            .modules
            .iter()
            .map(|entry| self.module_from_entry(entry))
            .collect::<miette::Result<Vec<_>>>()?;
        let constraint_sets = self
            .platforms
            .iter()
            .map(|entry| self.platform_from_entry(entry))
            .collect::<miette::Result<Vec<_>>>()?;
        Ok(Declarations::new(modules, constraint_sets))
    }

    fn group_for(&self, group: Option<&String>, what: &str) -> miette::Result<String> {
        group
            .or(self.workspace.group.as_ref())
            .cloned()
            .ok_or_else(|| {
                KilnError::Manifest {
                    message: format!("{what} has no group and [workspace] sets no default"),
                }
                .into()
            })
    }

    fn version_for(&self, version: Option<&String>, what: &str) -> miette::Result<Version> {
        version
            .or(self.workspace.version.as_ref())
            .map(|v| Version::parse(v))
            .ok_or_else(|| {
                KilnError::Manifest {
                    message: format!("{what} has no version and [workspace] sets no default"),
                }
                .into()
            })
    }

    fn module_from_entry(&self, entry: &ModuleEntry) -> miette::Result<Module> {
        let what = format!("module `{}`", entry.name);
        let coordinate = Coordinate {
            group: self.group_for(entry.group.as_ref(), &what)?,
            name: entry.name.clone(),
            version: self.version_for(entry.version.as_ref(), &what)?,
        };

        let dependencies = entry
            .dependencies
            .iter()
            .map(|dep| dependency_from_entry(dep, &entry.name))
            .collect::<miette::Result<Vec<_>>>()?;

        let outputs = entry
            .artifacts
            .iter()
            .map(|a| match a {
                ArtifactEntry::Path(path) => ArtifactOutput::new(path),
                ArtifactEntry::Detailed {
                    path,
                    classifier,
                    extension,
                } => {
                    let mut out = ArtifactOutput::new(path);
                    out.classifier = classifier.clone();
                    if let Some(ext) = extension {
                        out.extension = ext.clone();
                    }
                    out
                }
            })
            .collect();

        Ok(Module {
            coordinate,
            dependencies,
            platform: entry.platform.clone(),
            outputs,
            path: Some(PathBuf::from(entry.path.as_deref().unwrap_or(&entry.name))),
            build: entry.build.clone().or_else(|| self.workspace.build.clone()),
            inputs_digest: None,
        })
    }

    fn platform_from_entry(&self, entry: &PlatformEntry) -> miette::Result<ConstraintSet> {
        let what = format!("platform `{}`", entry.name);
        let coordinate = Coordinate {
            group: self.group_for(entry.group.as_ref(), &what)?,
            name: entry.name.clone(),
            version: self.version_for(entry.version.as_ref(), &what)?,
        };
        let mut set = ConstraintSet::new(&entry.name, coordinate);
        set.extends = entry.extends.clone();
        for (key, version) in &entry.constraints {
            let module = ModuleKey::parse(key).ok_or_else(|| KilnError::Manifest {
                message: format!("{what}: constraint key `{key}` is not `group:name`"),
            })?;
            set.recommendations.insert(module, Version::parse(version));
        }
        Ok(set)
    }
}

fn dependency_from_entry(entry: &DependencyEntry, module: &str) -> miette::Result<Dependency> {
    match entry {
        DependencyEntry::Short(s) => Dependency::parse(s).ok_or_else(|| {
            KilnError::Manifest {
                message: format!(
                    "module `{module}`: dependency `{s}` is not `group:name[:version]`"
                ),
            }
            .into()
        }),
        DependencyEntry::Project { project, group } => Ok(Dependency::Project {
            name: project.trim_start_matches(':').to_string(),
            group: group.clone(),
        }),
        DependencyEntry::Detailed {
            group,
            name,
            version,
            platform,
        } => Ok(Dependency::Coordinate {
            key: ModuleKey::new(group.clone(), name.clone()),
            version: match version {
                Some(v) => VersionSpec::exact(v),
                None => VersionSpec::Managed {
                    platform: platform.clone(),
                },
            },
        }),
    }
}

impl ModuleSource for Manifest {
    fn load(&self) -> miette::Result<Declarations> {
        self.declarations()
    }
}
