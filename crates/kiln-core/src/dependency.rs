use std::fmt;

use crate::coordinate::{Coordinate, ModuleKey};
use crate::version::Version;

/// The version half of a dependency request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// A pinned version.
    Exact(Version),
    /// Deferred to a constraint set: the named platform, or the declaring
    /// module's platform when `None`.
    Managed { platform: Option<String> },
}

impl VersionSpec {
    pub fn exact(version: &str) -> Self {
        Self::Exact(Version::parse(version))
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed { .. })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Managed { platform: Some(p) } => write!(f, "<managed by {p}>"),
            Self::Managed { platform: None } => f.write_str("<managed>"),
        }
    }
}

/// A declared dependency of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A `group:name` request with an exact or platform-managed version.
    Coordinate { key: ModuleKey, version: VersionSpec },
    /// A reference to another module declared in the same source.
    Project { name: String, group: Option<String> },
}

impl Dependency {
    pub fn exact(group: &str, name: &str, version: &str) -> Self {
        Self::Coordinate {
            key: ModuleKey::new(group, name),
            version: VersionSpec::exact(version),
        }
    }

    pub fn managed(group: &str, name: &str) -> Self {
        Self::Coordinate {
            key: ModuleKey::new(group, name),
            version: VersionSpec::Managed { platform: None },
        }
    }

    pub fn managed_by(group: &str, name: &str, platform: &str) -> Self {
        Self::Coordinate {
            key: ModuleKey::new(group, name),
            version: VersionSpec::Managed {
                platform: Some(platform.to_string()),
            },
        }
    }

    pub fn project(name: &str) -> Self {
        Self::Project {
            name: name.to_string(),
            group: None,
        }
    }

    /// Parse the shorthand forms `"group:name:version"` and `"group:name"`
    /// (platform-managed).
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(coord) = Coordinate::parse(s) {
            return Some(Self::Coordinate {
                key: coord.key(),
                version: VersionSpec::Exact(coord.version),
            });
        }
        ModuleKey::parse(s).map(|key| Self::Coordinate {
            key,
            version: VersionSpec::Managed { platform: None },
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinate { key, version } => write!(f, "{key}:{version}"),
            Self::Project {
                name,
                group: Some(g),
            } => write!(f, "project({g}:{name})"),
            Self::Project { name, group: None } => write!(f, "project({name})"),
        }
    }
}
