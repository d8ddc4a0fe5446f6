//! POM generation and reading: module POMs listing resolved dependencies and
//! platform BOMs listing managed versions.

use std::collections::BTreeMap;

use kiln_core::constraint::ConstraintSet;
use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::version::Version;
use kiln_scheduler::Artifact;
use kiln_util::errors::KilnError;
use serde::{Deserialize, Serialize};

const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";

/// The subset of a Maven POM Kiln writes and reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "project")]
pub struct Pom {
    #[serde(rename = "@xmlns", default = "namespace")]
    pub xmlns: String,
    #[serde(rename = "modelVersion", default = "model_version")]
    pub model_version: String,
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub version: String,
    #[serde(default = "jar")]
    pub packaging: String,
    #[serde(
        rename = "dependencyManagement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dependency_management: Option<DependencyManagement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManagement {
    #[serde(default)]
    pub dependencies: Dependencies,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    pub dependency: Vec<PomDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomDependency {
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub version: String,
}

fn namespace() -> String {
    POM_NAMESPACE.to_string()
}

fn model_version() -> String {
    "4.0.0".to_string()
}

fn jar() -> String {
    "jar".to_string()
}

impl PomDependency {
    fn new(coordinate: &Coordinate) -> Self {
        Self {
            group_id: coordinate.group.clone(),
            artifact_id: coordinate.name.clone(),
            version: coordinate.version.to_string(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&*self.group_id, &*self.artifact_id, &self.version)
    }
}

impl Pom {
    fn empty(coordinate: &Coordinate, packaging: &str) -> Self {
        Self {
            xmlns: namespace(),
            model_version: model_version(),
            group_id: coordinate.group.clone(),
            artifact_id: coordinate.name.clone(),
            version: coordinate.version.to_string(),
            packaging: packaging.to_string(),
            dependency_management: None,
            dependencies: None,
        }
    }

    /// POM for a built module. Packaging follows the main (unclassified) file.
    pub fn for_artifact(artifact: &Artifact) -> Self {
        let packaging = artifact
            .files
            .iter()
            .find(|f| f.classifier.is_none())
            .map_or("pom", |f| f.extension.as_str());
        let mut pom = Self::empty(&artifact.coordinate, packaging);
        if !artifact.dependencies.is_empty() {
            pom.dependencies = Some(Dependencies {
                dependency: artifact.dependencies.iter().map(PomDependency::new).collect(),
            });
        }
        pom
    }

    /// BOM for a platform, listing its effective recommendations.
    pub fn for_platform(set: &ConstraintSet, recommendations: &BTreeMap<ModuleKey, Version>) -> Self {
        let mut pom = Self::empty(&set.coordinate, "pom");
        pom.dependency_management = Some(DependencyManagement {
            dependencies: Dependencies {
                dependency: recommendations
                    .iter()
                    .map(|(key, version)| PomDependency::new(&key.at(version.clone())))
                    .collect(),
            },
        });
        pom
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&*self.group_id, &*self.artifact_id, &self.version)
    }

    /// Direct dependencies, in declaration order.
    pub fn dependency_coordinates(&self) -> Vec<Coordinate> {
        self.dependencies
            .iter()
            .flat_map(|d| &d.dependency)
            .map(PomDependency::coordinate)
            .collect()
    }

    /// Versions managed by a BOM.
    pub fn managed_versions(&self) -> BTreeMap<ModuleKey, Version> {
        self.dependency_management
            .iter()
            .flat_map(|m| &m.dependencies.dependency)
            .map(|d| {
                let c = d.coordinate();
                (c.key(), c.version)
            })
            .collect()
    }

    pub fn to_xml(&self) -> miette::Result<String> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        self.serialize(serializer).map_err(|e| KilnError::Repository {
            message: format!("failed to write POM for {}: {e}", self.coordinate()),
        })?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
    }

    pub fn parse(xml: &str) -> miette::Result<Self> {
        quick_xml::de::from_str(xml).map_err(|e| {
            KilnError::Repository {
                message: format!("invalid POM: {e}"),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_scheduler::ArtifactFile;

    #[test]
    fn module_pom_lists_dependencies() {
        let mut artifact = Artifact::new(Coordinate::new("org.example", "app", "2.0.0"))
            .with_file(ArtifactFile {
                path: "app.jar".into(),
                classifier: None,
                extension: "jar".into(),
            });
        artifact.dependencies = vec![
            Coordinate::new("org.example", "core", "2.0.0"),
            Coordinate::new("com.google.guava", "guava", "33.0-jre"),
        ];

        let xml = Pom::for_artifact(&artifact).to_xml().unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<artifactId>app</artifactId>"));
        assert!(xml.contains("<packaging>jar</packaging>"));
        assert!(xml.contains("<version>33.0-jre</version>"));

        let parsed = Pom::parse(&xml).unwrap();
        assert_eq!(parsed.coordinate(), artifact.coordinate);
        assert_eq!(parsed.dependency_coordinates(), artifact.dependencies);
    }

    #[test]
    fn artifact_without_files_is_pom_packaged() {
        let artifact = Artifact::new(Coordinate::new("org.example", "meta", "1.0"));
        let pom = Pom::for_artifact(&artifact);
        assert_eq!(pom.packaging, "pom");
        assert!(!pom.to_xml().unwrap().contains("<dependencies"));
    }

    #[test]
    fn bom_manages_versions() {
        let set = ConstraintSet::new(
            "platform-v2",
            Coordinate::new("org.example", "platform-v2", "2.0.0"),
        )
        .recommend("org.example", "core", "2.0.0");
        let mut flattened = set.recommendations.clone();
        flattened.insert(ModuleKey::new("org.example", "util"), Version::parse("1.0.0"));

        let xml = Pom::for_platform(&set, &flattened).to_xml().unwrap();
        assert!(xml.contains("<dependencyManagement>"));
        assert!(xml.contains("<packaging>pom</packaging>"));

        let parsed = Pom::parse(&xml).unwrap();
        assert_eq!(parsed.managed_versions(), flattened);
        assert!(parsed.dependency_coordinates().is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Pom::parse("<project><groupId>g</groupId>").is_err());
    }
}
