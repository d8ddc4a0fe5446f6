//! Publishing to and fetching from a file-backed repository.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use kiln_core::constraint::ConstraintSet;
use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::repository::Repository;
use kiln_core::version::Version;
use kiln_scheduler::{Artifact, ArtifactFile, PublishError, PublishReceipt, Publisher};
use kiln_util::errors::KilnError;
use kiln_util::fs::ensure_dir;

use crate::checksum;
use crate::layout;
use crate::pom::Pom;

/// A Maven-layout repository rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the directory behind a configured repository.
    ///
    /// Relative paths resolve against `base`. Network URLs are rejected.
    pub fn open(repository: &Repository, base: &Path) -> miette::Result<Self> {
        match repository.local_path(base) {
            Some(root) => Ok(Self::new(root)),
            None => Err(KilnError::Repository {
                message: format!(
                    "repository `{}` ({}) is not a file repository",
                    repository.name, repository.url
                ),
            }
            .into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file of `coordinate`.
    pub fn coordinate_dir(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(layout::coordinate_dir(coordinate))
    }

    fn pom_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.coordinate_dir(coordinate)
            .join(layout::pom_name(coordinate))
    }

    /// Whether `coordinate` has been published here.
    pub fn exists(&self, coordinate: &Coordinate) -> bool {
        self.pom_path(coordinate).is_file()
    }

    fn store(&self, target: &Path, data: &[u8]) -> miette::Result<()> {
        if let Some(parent) = target.parent() {
            ensure_dir(parent).map_err(KilnError::Io)?;
        }
        fs::write(target, data).map_err(KilnError::Io)?;
        checksum::write_sidecars(target, data)?;
        Ok(())
    }

    /// Copy an artifact's files into the layout and write its POM.
    ///
    /// Returns the stored paths relative to the repository root, POM last.
    pub fn publish_artifact(&self, artifact: &Artifact) -> miette::Result<Vec<String>> {
        let coordinate = &artifact.coordinate;
        let dir = self.coordinate_dir(coordinate);
        let mut locations = Vec::with_capacity(artifact.files.len() + 1);

        for file in &artifact.files {
            let data = fs::read(&file.path).map_err(|e| KilnError::Repository {
                message: format!("cannot read {}: {e}", file.path.display()),
            })?;
            let target = dir.join(layout::file_name(
                coordinate,
                file.classifier.as_deref(),
                &file.extension,
            ));
            self.store(&target, &data)?;
            tracing::debug!("stored {} as {}", file.path.display(), target.display());
            locations.push(layout::display_relative(&self.root, &target));
        }

        let pom = self.pom_path(coordinate);
        self.store(&pom, Pom::for_artifact(artifact).to_xml()?.as_bytes())?;
        locations.push(layout::display_relative(&self.root, &pom));

        tracing::info!("published {coordinate} to {}", self.root.display());
        Ok(locations)
    }

    /// Publish a platform as a BOM with its effective recommendations.
    pub fn publish_platform(
        &self,
        set: &ConstraintSet,
        recommendations: &BTreeMap<ModuleKey, Version>,
    ) -> miette::Result<String> {
        let pom = self.pom_path(&set.coordinate);
        self.store(&pom, Pom::for_platform(set, recommendations).to_xml()?.as_bytes())?;
        tracing::info!("published platform {} as {}", set.name, set.coordinate);
        Ok(layout::display_relative(&self.root, &pom))
    }

    /// Read a published coordinate back, verifying every file's checksums.
    ///
    /// Returns `Ok(None)` when nothing was published for `coordinate`.
    pub fn fetch(&self, coordinate: &Coordinate) -> miette::Result<Option<Artifact>> {
        let pom_path = self.pom_path(coordinate);
        if !pom_path.is_file() {
            return Ok(None);
        }
        checksum::verify(&pom_path)?;
        let xml = fs::read_to_string(&pom_path).map_err(KilnError::Io)?;
        let pom = Pom::parse(&xml)?;

        let dir = self.coordinate_dir(coordinate);
        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(KilnError::Io)?
            .flatten()
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| !checksum::is_sidecar(name))
            .collect();
        names.sort();

        let mut artifact = Artifact::new(coordinate.clone());
        artifact.dependencies = pom.dependency_coordinates();
        for name in names {
            let Some((classifier, extension)) = layout::parse_file_name(coordinate, &name) else {
                continue;
            };
            if classifier.is_none() && extension == "pom" {
                continue;
            }
            let path = dir.join(&name);
            checksum::verify(&path)?;
            artifact.files.push(ArtifactFile {
                path,
                classifier,
                extension,
            });
        }
        tracing::debug!("fetched {coordinate} ({} files)", artifact.files.len());
        Ok(Some(artifact))
    }

    /// Managed versions of a published BOM.
    pub fn fetch_platform(
        &self,
        coordinate: &Coordinate,
    ) -> miette::Result<Option<BTreeMap<ModuleKey, Version>>> {
        let pom_path = self.pom_path(coordinate);
        if !pom_path.is_file() {
            return Ok(None);
        }
        checksum::verify(&pom_path)?;
        let xml = fs::read_to_string(&pom_path).map_err(KilnError::Io)?;
        Ok(Some(Pom::parse(&xml)?.managed_versions()))
    }
}

/// Publishes into whichever file repository each call names.
#[derive(Debug, Clone)]
pub struct FilePublisher {
    base: PathBuf,
}

impl FilePublisher {
    /// Relative repository paths resolve against `base`, usually the
    /// workspace root.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl Publisher for FilePublisher {
    fn publish(
        &self,
        artifact: &Artifact,
        coordinate: &Coordinate,
        repository: &Repository,
    ) -> Result<PublishReceipt, PublishError> {
        if artifact.coordinate != *coordinate {
            return Err(PublishError::new(format!(
                "artifact {} cannot be published as {coordinate}",
                artifact.coordinate
            )));
        }
        let locations = FileRepository::open(repository, &self.base)
            .and_then(|repo| repo.publish_artifact(artifact))
            .map_err(|e| PublishError::new(e.to_string()))?;
        Ok(PublishReceipt {
            repository: repository.name.clone(),
            locations,
        })
    }
}
