//! Data structures produced by the bundle builder and the release pipeline.

use std::fmt;
use std::path::PathBuf;

/// Outcome of copying the project tree into the bundle directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
  /// Top-level entries copied into the bundle.
  pub copied: Vec<String>,
  /// Top-level entries filtered out or whose copy failed.
  pub skipped: Vec<String>,
}

impl AssemblyReport {
  /// Number of copied top-level entries.
  pub fn copied_count(&self) -> usize {
    self.copied.len()
  }

  /// Number of skipped top-level entries.
  pub fn skipped_count(&self) -> usize {
    self.skipped.len()
  }
}

/// Archives placed in the bundle's dependency directory by the pre-fetch step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyArchiveSet {
  /// Directory holding the archives.
  pub dir: PathBuf,
  /// Archive file names, sorted.
  pub archives: Vec<String>,
}

impl DependencyArchiveSet {
  /// Split archives into the project's own artifact(s) and supporting dependencies.
  ///
  /// The match mirrors the generated installer: a file belongs to the project when its name
  /// starts with the project name, comparing case-insensitively and treating `-` and `_` alike.
  pub fn partition(&self, project_name: &str) -> (Vec<&str>, Vec<&str>) {
    let prefix = normalize_artifact_name(project_name);
    self
      .archives
      .iter()
      .map(String::as_str)
      .partition(|name| normalize_artifact_name(name).starts_with(&prefix))
  }
}

/// Lower-case `name` and fold `-` into `_`, the way wheel file names are normalised.
pub fn normalize_artifact_name(name: &str) -> String {
  name.to_lowercase().replace('-', "_")
}

/// Summary of a finished bundle build.
#[derive(Debug, Clone)]
pub struct BundleReport {
  /// Bundle output directory.
  pub bundle_dir: PathBuf,
  /// Copy results for the project tree.
  pub assembly: AssemblyReport,
  /// Pre-fetched archives, absent when the pre-fetch failed.
  pub dependencies: Option<DependencyArchiveSet>,
  /// Location of the generated bootstrap installer.
  pub installer_path: PathBuf,
}

impl BundleReport {
  /// Whether the bundle carries dependency archives for offline installation.
  pub fn has_dependencies(&self) -> bool {
    self.dependencies.is_some()
  }
}

/// Upload choice made by the operator after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
  /// Upload to the staging index only.
  StagingOnly,
  /// Upload to staging, then to production.
  StagingThenProduction,
  /// Upload straight to production.
  ProductionOnly,
  /// Leave without uploading.
  Abort,
}

impl PublishAction {
  /// Every action, in menu order.
  pub const ALL: [PublishAction; 4] = [
    PublishAction::StagingOnly,
    PublishAction::StagingThenProduction,
    PublishAction::ProductionOnly,
    PublishAction::Abort,
  ];
}

impl fmt::Display for PublishAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Self::StagingOnly => "Staging only (TestPyPI)",
      Self::StagingThenProduction => "Staging, then production (TestPyPI -> PyPI)",
      Self::ProductionOnly => "Production only (PyPI)",
      Self::Abort => "Exit without uploading",
    };
    f.write_str(label)
  }
}

/// Result of a release pipeline run that did not abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
  /// Version read from the packaging manifest.
  pub version: String,
  /// Action chosen by the operator.
  pub action: PublishAction,
  /// Whether the staging upload ran.
  pub staging_uploaded: bool,
  /// Whether the production upload ran.
  pub production_uploaded: bool,
}
