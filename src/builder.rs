//! Offline bundle orchestrator: copy the project, fetch dependencies, write the installer.

use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::bundle::{
  InstallerScript, SkipList, assemble_bundle, prefetch_dependencies, prepare_bundle_dir,
};
use crate::models::BundleReport;
use crate::process::CommandRunner;
use crate::project::ProjectContext;
use crate::selection::EntryFilter;

/// High-level helper assembling an offline installer bundle for a project.
pub struct BundleBuilder<'a, R: CommandRunner + ?Sized> {
  context: &'a ProjectContext,
  runner: &'a R,
  skip_paths: Vec<PathBuf>,
}

impl<'a, R: CommandRunner + ?Sized> BundleBuilder<'a, R> {
  /// Create a builder for the provided project context.
  pub fn new(context: &'a ProjectContext, runner: &'a R) -> Self {
    Self {
      context,
      runner,
      skip_paths: Vec::new(),
    }
  }

  /// Never copy `path` into the bundle, e.g. the running executable.
  pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.skip_paths.push(path.into());
    self
  }

  /// Rebuild the bundle directory from scratch and return what ended up in it.
  ///
  /// Fails when the bundle directory cannot be prepared, when no project entry was copied,
  /// or when the installer cannot be written. A failed dependency download only disables the
  /// offline installation stage of the generated installer.
  pub fn build(&self) -> Result<BundleReport> {
    let config = &self.context.config;
    let root = self.context.root();
    log::info!("Creating {} offline installer...", config.project_name);

    let bundle_name = config.bundle_dir_name_at(chrono::Local::now().naive_local());
    let bundle_dir = root.join(bundle_name);
    log::info!("Creating installer directory: {}", bundle_dir.display());
    prepare_bundle_dir(&bundle_dir)?;

    let filter = EntryFilter::new(config.rules.clone(), config.essential_files.clone());
    let skips = self
      .skip_paths
      .iter()
      .fold(SkipList::new(&bundle_dir, &config.bundle_dir_name), |skips, path| {
        skips.with_path(path)
      });

    log::info!("Copying files from: {}", root.display());
    let assembly = assemble_bundle(root, &bundle_dir, &filter, &skips)?;
    log::info!(
      "Copied {} item(s), skipped {}",
      assembly.copied_count(),
      assembly.skipped_count()
    );
    if assembly.copied_count() == 0 {
      bail!("no project files were copied into {}", bundle_dir.display());
    }

    let dependencies = prefetch_dependencies(
      self.runner,
      &self.context.python,
      root,
      &bundle_dir,
      &config.dependencies_dir_name,
    );
    if let Some(set) = &dependencies {
      let (main, supporting) = set.partition(&config.project_name);
      log::info!(
        "Bundled {} project archive(s) and {} supporting archive(s)",
        main.len(),
        supporting.len()
      );
    }

    let installer_path = bundle_dir.join(&config.installer_file_name);
    InstallerScript::from_config(config, dependencies.is_some()).write(&installer_path)?;
    log::info!("Created: {}", config.installer_file_name);

    Ok(BundleReport {
      bundle_dir,
      assembly,
      dependencies,
      installer_path,
    })
  }
}
