use serde::{Deserialize, Serialize};
use std::path::Path;

use kiln_util::errors::KilnError;

use crate::coordinate::Coordinate;

/// Deterministic record of the resolved module graph, written to `Kiln.lock`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub package: Vec<LockedPackage>,
}

/// A single resolved coordinate and the coordinates it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub group: String,
    pub version: String,
    /// `"workspace"` for declared modules, `"repository"` for externals.
    pub source: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl LockedPackage {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.group.clone(), self.name.clone(), &self.version)
    }
}

impl Lockfile {
    /// Load and parse a `Kiln.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Generic {
            message: format!("Failed to read lockfile: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            KilnError::Generic {
                message: format!("Failed to parse lockfile: {e}"),
            }
            .into()
        })
    }

    /// Serialize the lockfile to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write the lockfile, sorting packages first so output is stable.
    pub fn write_to(&mut self, path: &Path) -> miette::Result<()> {
        self.package.sort_by_key(|p| p.coordinate());
        let content = self.to_string_pretty().map_err(|e| KilnError::Generic {
            message: format!("Failed to serialize lockfile: {e}"),
        })?;
        std::fs::write(path, content).map_err(KilnError::Io)?;
        Ok(())
    }

    pub fn find(&self, coordinate: &Coordinate) -> Option<&LockedPackage> {
        self.package.iter().find(|p| &p.coordinate() == coordinate)
    }
}
