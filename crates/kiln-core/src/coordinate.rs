//! Module coordinates: `group:name` keys and `group:name:version` units.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Identifies a module across all of its versions (`group:name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleKey {
    pub group: String,
    pub name: String,
}

impl ModuleKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse `"group:name"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (group, name) = s.split_once(':')?;
        if group.is_empty() || name.is_empty() || name.contains(':') {
            return None;
        }
        Some(Self::new(group, name))
    }

    pub fn at(&self, version: Version) -> Coordinate {
        Coordinate {
            group: self.group.clone(),
            name: self.name.clone(),
            version,
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A resolvable unit: one version of one module.
///
/// The derived ordering (group, name, then version ordering) is the natural
/// ordering used wherever Kiln needs determinism.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: Version,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: &str) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: Version::parse(version),
        }
    }

    /// Parse `"group:name:version"` into a coordinate.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Some(Self::new(*group, *name, version))
            }
            _ => None,
        }
    }

    pub fn key(&self) -> ModuleKey {
        ModuleKey::new(self.group.clone(), self.name.clone())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}
