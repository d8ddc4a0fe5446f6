//! Builds modules by running their shell command.

use std::path::{Path, PathBuf};

use kiln_core::coordinate::Coordinate;
use kiln_scheduler::{Artifact, ArtifactFile, CompileError, Compiler, PlannedModule};
use kiln_util::fs::ensure_dir;
use kiln_util::process::CommandBuilder;
use kiln_util::progress::status;

use crate::context::{module_dir, WorkspaceContext};

/// Runs `sh -c <build>` in the module directory, then collects the
/// module's declared artifacts.
///
/// The command sees `KILN_GROUP`, `KILN_MODULE`, `KILN_VERSION` and
/// `KILN_OUTPUT_DIR`, a per-coordinate scratch directory that exists before
/// the command starts. Declared artifact paths are relative to the module
/// directory.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    root: PathBuf,
    output_root: PathBuf,
}

impl CommandCompiler {
    pub fn new(root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn for_workspace(ctx: &WorkspaceContext) -> Self {
        Self::new(&ctx.root, ctx.output_root())
    }

    pub fn output_dir(&self, coordinate: &Coordinate) -> PathBuf {
        self.output_root
            .join(&coordinate.group)
            .join(&coordinate.name)
            .join(coordinate.version.to_string())
    }

    fn run(&self, step: &PlannedModule, dir: &Path, script: &str) -> Result<(), CompileError> {
        let coordinate = &step.coordinate;
        let output_dir = self.output_dir(coordinate);
        ensure_dir(&output_dir).map_err(|e| {
            CompileError::new(format!("cannot create {}: {e}", output_dir.display()))
        })?;
        CommandBuilder::shell(script)
            .cwd(dir)
            .env("KILN_GROUP", &coordinate.group)
            .env("KILN_MODULE", &coordinate.name)
            .env("KILN_VERSION", coordinate.version.to_string())
            .env("KILN_OUTPUT_DIR", output_dir.to_string_lossy())
            .exec_checked()
            .map_err(|e| CompileError::new(format!("{coordinate}: {e}")))?;
        Ok(())
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, step: &PlannedModule) -> Result<Artifact, CompileError> {
        let coordinate = &step.coordinate;
        let dir = self.root.join(module_dir(&step.module));
        if !dir.is_dir() {
            return Err(CompileError::new(format!(
                "{coordinate}: module directory {} does not exist",
                dir.display()
            )));
        }

        status("Compiling", &coordinate.to_string());
        match &step.module.build {
            Some(script) => self.run(step, &dir, script)?,
            None => tracing::debug!("{coordinate} has no build command"),
        }

        let mut artifact = Artifact::new(coordinate.clone());
        for output in &step.module.outputs {
            let path = dir.join(&output.path);
            if !path.is_file() {
                return Err(CompileError::new(format!(
                    "{coordinate}: declared artifact {} was not produced",
                    output.path.display()
                )));
            }
            artifact = artifact.with_file(ArtifactFile {
                path,
                classifier: output.classifier.clone(),
                extension: output.extension.clone(),
            });
        }
        artifact.dependencies = step.all_dependencies();
        Ok(artifact)
    }
}
