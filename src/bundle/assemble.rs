//! Copy the filtered project tree into a fresh bundle directory.

use std::fs::{self, File, FileTimes};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use same_file::is_same_file;
use walkdir::{DirEntry, WalkDir};

use crate::models::AssemblyReport;
use crate::selection::EntryInclusion;

/// Entries of the source root that are never considered for copying.
#[derive(Debug, Clone)]
pub struct SkipList {
  bundle_dir: PathBuf,
  bundle_prefix: String,
  paths: Vec<PathBuf>,
}

impl SkipList {
  /// Skip the bundle being built and any earlier bundle whose name starts with `bundle_prefix`.
  pub fn new(bundle_dir: impl Into<PathBuf>, bundle_prefix: impl Into<String>) -> Self {
    Self {
      bundle_dir: bundle_dir.into(),
      bundle_prefix: bundle_prefix.into(),
      paths: Vec::new(),
    }
  }

  /// Also skip `path`, typically the running executable.
  pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.paths.push(path.into());
    self
  }

  fn should_skip(&self, name: &str, path: &Path) -> bool {
    if !self.bundle_prefix.is_empty() && name.starts_with(&self.bundle_prefix) {
      return true;
    }
    if is_same_file(path, &self.bundle_dir).unwrap_or(false) {
      return true;
    }
    self
      .paths
      .iter()
      .any(|skip| is_same_file(path, skip).unwrap_or(false))
  }
}

/// Remove `bundle_dir` if present and create it empty.
pub fn prepare_bundle_dir(bundle_dir: &Path) -> Result<()> {
  match fs::remove_dir_all(bundle_dir) {
    Ok(()) => log::info!("Removed previous bundle at {}", bundle_dir.display()),
    Err(err) if err.kind() == ErrorKind::NotFound => {}
    Err(err) => {
      return Err(err).with_context(|| format!("failed to remove {}", bundle_dir.display()));
    }
  }
  fs::create_dir_all(bundle_dir)
    .with_context(|| format!("failed to create {}", bundle_dir.display()))
}

/// Copy every top-level entry of `source_root` that passes `filter` into `bundle_dir`.
///
/// Directories are checked once at the top level; files inside a copied directory are each
/// re-checked with the file-level filter. A failure copying one entry is logged and counted as
/// skipped; only an unreadable source root is an error. Inside a directory, a failed nested
/// entry does not stop its siblings from being copied, but the directory is still reported as
/// skipped.
pub fn assemble_bundle<F: EntryInclusion + ?Sized>(
  source_root: &Path,
  bundle_dir: &Path,
  filter: &F,
  skips: &SkipList,
) -> Result<AssemblyReport> {
  let mut entries: Vec<_> = fs::read_dir(source_root)
    .with_context(|| format!("failed to read {}", source_root.display()))?
    .flatten()
    .collect();
  entries.sort_by_key(|entry| entry.file_name());

  let mut report = AssemblyReport::default();
  for entry in entries {
    let name = entry.file_name().to_string_lossy().into_owned();
    let source = entry.path();

    if skips.should_skip(&name, &source) {
      log::info!("Skipping: {}", name);
      report.skipped.push(name);
      continue;
    }

    if filter.is_excluded(&name, &source) {
      log::debug!("Excluded: {}", name);
      report.skipped.push(name);
      continue;
    }

    let destination = bundle_dir.join(&name);
    let result = if source.is_dir() {
      log::info!("Copying directory: {}", name);
      copy_dir_filtered(&source, &destination, filter)
    } else {
      log::info!("Copying file: {}", name);
      copy_file_preserving(&source, &destination)
    };

    match result {
      Ok(()) => report.copied.push(name),
      Err(err) => {
        log::warn!("Failed to copy {}: {:#}", name, err);
        report.skipped.push(name);
      }
    }
  }

  Ok(report)
}

fn copy_dir_filtered<F: EntryInclusion + ?Sized>(
  source: &Path,
  destination: &Path,
  filter: &F,
) -> Result<()> {
  let mut failures = 0usize;
  for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
    if let Err(err) = copy_nested_entry(entry, source, destination, filter) {
      log::warn!("Failed to copy inside {}: {:#}", source.display(), err);
      failures += 1;
    }
  }

  if failures > 0 {
    bail!(
      "{} nested entr{} of {} could not be copied",
      failures,
      if failures == 1 { "y" } else { "ies" },
      source.display()
    );
  }
  Ok(())
}

fn copy_nested_entry<F: EntryInclusion + ?Sized>(
  entry: walkdir::Result<DirEntry>,
  source: &Path,
  destination: &Path,
  filter: &F,
) -> Result<()> {
  let entry = entry?;
  let relative = entry.path().strip_prefix(source)?;
  let target = destination.join(relative);

  if entry.file_type().is_dir() {
    return fs::create_dir_all(&target)
      .with_context(|| format!("failed to create {}", target.display()));
  }

  let name = entry.file_name().to_string_lossy();
  if filter.is_file_excluded(&name) {
    log::debug!("Excluded: {}", entry.path().display());
    return Ok(());
  }
  copy_file_preserving(entry.path(), &target)
}

/// Byte-for-byte copy keeping permissions and access/modification times.
pub fn copy_file_preserving(source: &Path, destination: &Path) -> Result<()> {
  fs::copy(source, destination).with_context(|| {
    format!(
      "failed to copy {} to {}",
      source.display(),
      destination.display()
    )
  })?;

  let metadata = fs::metadata(source)
    .with_context(|| format!("failed to read metadata of {}", source.display()))?;
  let mut times = FileTimes::new();
  if let Ok(modified) = metadata.modified() {
    times = times.set_modified(modified);
  }
  if let Ok(accessed) = metadata.accessed() {
    times = times.set_accessed(accessed);
  }

  let file = File::options()
    .write(true)
    .open(destination)
    .or_else(|_| File::open(destination))
    .with_context(|| format!("failed to open {}", destination.display()))?;
  file
    .set_times(times)
    .with_context(|| format!("failed to set timestamps on {}", destination.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::selection::{EntryFilter, FilterRuleSet};
  use std::collections::BTreeSet;
  use std::time::{Duration, SystemTime};
  use tempfile::tempdir;

  fn filter() -> EntryFilter {
    EntryFilter::new(
      FilterRuleSet::default(),
      vec!["setup.py".into(), "README.md".into()],
    )
  }

  fn listing(dir: &Path) -> BTreeSet<String> {
    WalkDir::new(dir)
      .min_depth(1)
      .into_iter()
      .flatten()
      .map(|entry| {
        entry
          .path()
          .strip_prefix(dir)
          .unwrap()
          .to_string_lossy()
          .replace('\\', "/")
      })
      .collect()
  }

  fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  #[test]
  fn copies_only_qualifying_top_level_entries() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    write(&root.join("setup.py"), "setup()");
    write(&root.join("README.md"), "# readme");
    write(&root.join(".git/HEAD"), "ref: refs/heads/main");
    write(&root.join("__pycache__/foo.cpython-311.pyc"), "bytecode");
    write(&root.join("test_foo.py"), "def test(): pass");
    write(&root.join("foo.py"), "print('foo')");

    let bundle = root.join("bundle_out");
    prepare_bundle_dir(&bundle).unwrap();
    let report =
      assemble_bundle(&root, &bundle, &filter(), &SkipList::new(&bundle, "bundle_out")).unwrap();

    let expected: BTreeSet<String> = ["README.md", "foo.py", "setup.py"]
      .into_iter()
      .map(String::from)
      .collect();
    assert_eq!(listing(&bundle), expected);
    assert_eq!(report.copied_count(), 3);
    assert!(report.skipped.contains(&"bundle_out".to_string()));
    assert!(report.skipped.contains(&".git".to_string()));
  }

  #[test]
  fn nested_files_are_filtered_but_directories_are_kept() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    write(&root.join("pkg/__init__.py"), "");
    write(&root.join("pkg/core.py"), "x = 1");
    write(&root.join("pkg/core.pyc"), "bytecode");
    write(&root.join("pkg/test_core.py"), "");
    write(&root.join("pkg/__pycache__/core.cpython-311.pyc"), "bytecode");
    write(&root.join("pkg/data/README.md"), "nested essential");

    let bundle = temp.path().join("out");
    prepare_bundle_dir(&bundle).unwrap();
    assemble_bundle(&root, &bundle, &filter(), &SkipList::new(&bundle, "out")).unwrap();

    let expected: BTreeSet<String> = [
      "pkg",
      "pkg/__init__.py",
      "pkg/core.py",
      "pkg/__pycache__",
      "pkg/data",
      "pkg/data/README.md",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(listing(&bundle), expected);
  }

  #[test]
  fn earlier_bundles_sharing_the_prefix_are_skipped() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(&root.join("foo.py"), "");
    write(&root.join("app_offline_installer_20240101_000000/foo.py"), "");

    let bundle = root.join("app_offline_installer_20250101_000000");
    prepare_bundle_dir(&bundle).unwrap();
    let report =
      assemble_bundle(root, &bundle, &filter(), &SkipList::new(&bundle, "app_offline_installer"))
        .unwrap();

    assert_eq!(report.copied, vec!["foo.py".to_string()]);
    assert_eq!(report.skipped_count(), 2);
  }

  #[test]
  fn explicit_skip_paths_are_honoured() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    write(&root.join("foo.py"), "");
    write(&root.join("release-tool"), "binary");

    let bundle = temp.path().join("out");
    prepare_bundle_dir(&bundle).unwrap();
    let skips = SkipList::new(&bundle, "out").with_path(root.join("release-tool"));
    let report = assemble_bundle(&root, &bundle, &filter(), &skips).unwrap();

    assert_eq!(report.copied, vec!["foo.py".to_string()]);
    assert!(!bundle.join("release-tool").exists());
  }

  #[test]
  fn reassembly_is_idempotent() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    write(&root.join("setup.py"), "setup()");
    write(&root.join("pkg/mod.py"), "");
    write(&root.join("build/lib/pkg/mod.py"), "");

    let bundle = root.join("out");
    let skips = SkipList::new(&bundle, "out");

    prepare_bundle_dir(&bundle).unwrap();
    assemble_bundle(&root, &bundle, &filter(), &skips).unwrap();
    write(&bundle.join("stale.txt"), "left over");
    let first = listing(&bundle);

    prepare_bundle_dir(&bundle).unwrap();
    assemble_bundle(&root, &bundle, &filter(), &skips).unwrap();
    let second = listing(&bundle);

    assert!(first.contains("stale.txt"));
    assert!(!second.contains("stale.txt"));
    assert_eq!(
      first.into_iter().filter(|entry| entry != "stale.txt").collect::<BTreeSet<_>>(),
      second
    );
  }

  #[cfg(unix)]
  #[test]
  fn nested_copy_failure_still_copies_siblings() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    write(&root.join("foo.py"), "");
    write(&root.join("pkg/a.py"), "a");
    write(&root.join("pkg/z.py"), "z");
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("pkg/broken.py")).unwrap();

    let bundle = temp.path().join("out");
    prepare_bundle_dir(&bundle).unwrap();
    let report = assemble_bundle(&root, &bundle, &filter(), &SkipList::new(&bundle, "out")).unwrap();

    assert_eq!(fs::read_to_string(bundle.join("pkg/a.py")).unwrap(), "a");
    assert_eq!(fs::read_to_string(bundle.join("pkg/z.py")).unwrap(), "z");
    assert!(!bundle.join("pkg/broken.py").exists());
    assert_eq!(report.copied, vec!["foo.py".to_string()]);
    assert_eq!(report.skipped, vec!["pkg".to_string()]);
  }

  #[cfg(unix)]
  #[test]
  fn failed_top_level_copy_is_skipped_and_assembly_continues() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    write(&root.join("foo.py"), "");
    write(&root.join("zeta.py"), "");
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling.py")).unwrap();

    let bundle = temp.path().join("out");
    prepare_bundle_dir(&bundle).unwrap();
    let report = assemble_bundle(&root, &bundle, &filter(), &SkipList::new(&bundle, "out")).unwrap();

    assert_eq!(report.copied, vec!["foo.py".to_string(), "zeta.py".to_string()]);
    assert_eq!(report.skipped, vec!["dangling.py".to_string()]);
    assert!(bundle.join("zeta.py").exists());
  }

  #[test]
  fn copies_preserve_modification_time() {
    let temp = tempdir().unwrap();
    let source = temp.path().join("source.txt");
    fs::write(&source, "payload").unwrap();
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    File::options()
      .write(true)
      .open(&source)
      .unwrap()
      .set_modified(stamp)
      .unwrap();

    let destination = temp.path().join("copy.txt");
    copy_file_preserving(&source, &destination).unwrap();

    assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
    assert_eq!(fs::metadata(&destination).unwrap().modified().unwrap(), stamp);
  }

  #[test]
  fn prepare_bundle_dir_clears_previous_contents() {
    let temp = tempdir().unwrap();
    let bundle = temp.path().join("bundle");
    write(&bundle.join("old/file.txt"), "old");

    prepare_bundle_dir(&bundle).unwrap();

    assert!(bundle.is_dir());
    assert_eq!(fs::read_dir(&bundle).unwrap().count(), 0);
  }
}
