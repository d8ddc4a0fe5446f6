use std::path::PathBuf;

use crate::coordinate::Coordinate;
use crate::dependency::Dependency;

/// A buildable unit declared by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub coordinate: Coordinate,
    /// Declared dependencies, in declaration order.
    pub dependencies: Vec<Dependency>,
    /// Constraint set consulted for platform-managed dependencies.
    pub platform: Option<String>,
    /// Files the build produces and publishes.
    pub outputs: Vec<ArtifactOutput>,
    /// Module directory, relative to the workspace root.
    pub path: Option<PathBuf>,
    /// Shell command that builds the outputs.
    pub build: Option<String>,
    /// Digest of the module's input files, when known.
    pub inputs_digest: Option<String>,
}

impl Module {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            dependencies: Vec::new(),
            platform: None,
            outputs: Vec::new(),
            path: None,
            build: None,
            inputs_digest: None,
        }
    }

    pub fn with_dependency(mut self, dep: Dependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }

    pub fn with_output(mut self, output: ArtifactOutput) -> Self {
        self.outputs.push(output);
        self
    }
}

/// One published file of a module, e.g. the main jar or a `sources` jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutput {
    /// Path of the built file, relative to the module directory.
    pub path: PathBuf,
    pub classifier: Option<String>,
    /// Extension used in the repository layout; defaults to the file's own.
    pub extension: String,
}

impl ArtifactOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "jar".to_string());
        Self {
            path,
            classifier: None,
            extension,
        }
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }
}
