//! Build distributables and validate them before upload.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Stage, run_checked};
use crate::error::{ReleaseError, Result};
use crate::process::{CommandRunner, CommandSpec};
use crate::project::ProjectContext;

/// Run the build front-end from the project root.
pub fn build_distributions<R: CommandRunner + ?Sized>(
    runner: &R,
    context: &ProjectContext,
) -> Result<()> {
    let spec = CommandSpec::python_module(&context.python, "build").current_dir(context.root());
    run_checked(runner, Stage::Build, &spec)?;
    log::info!("Package build finished");
    Ok(())
}

/// Require at least one artifact in the dist directory and run `twine check` on all of them.
pub fn check_distributions<R: CommandRunner + ?Sized>(
    runner: &R,
    context: &ProjectContext,
) -> Result<Vec<PathBuf>> {
    let dist = context.dist_dir();
    let artifacts = list_artifacts(&dist)?;
    if artifacts.is_empty() {
        return Err(ReleaseError::NoArtifacts { dir: dist });
    }

    log::info!("Built artifacts:");
    for artifact in &artifacts {
        log::info!("  {}", artifact.display());
    }

    let spec = CommandSpec::python_module(&context.python, "twine")
        .arg("check")
        .args(&artifacts)
        .current_dir(context.root());
    run_checked(runner, Stage::QualityCheck, &spec)?;
    log::info!("Package quality check passed");
    Ok(artifacts)
}

/// Files directly inside `dist`, sorted. A missing directory has no artifacts.
pub fn list_artifacts(dist: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dist) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            artifacts.push(entry.path());
        }
    }
    artifacts.sort();
    Ok(artifacts)
}
