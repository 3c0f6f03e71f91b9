//! Rules deciding which project entries are copied into the offline bundle.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Trait describing selection filters for bundle content.
pub trait EntryInclusion {
  /// Returns `true` when the entry at `path` (named `name`) should be left out of the bundle.
  fn is_excluded(&self, name: &str, path: &Path) -> bool;

  /// File-level decision applied to files nested inside copied directories.
  fn is_file_excluded(&self, name: &str) -> bool;
}

/// Rule category that caused an entry to be excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
  /// The name is listed verbatim in the exclusion table.
  ExactName,
  /// The file extension is a compiled or temporary one.
  Extension,
  /// The name carries a backup-file marker.
  BackupSuffix,
  /// The name is egg metadata left behind by setuptools.
  EggMetadata,
  /// The name follows the test-file naming convention.
  TestFile,
}

/// Declarative exclusion table.
///
/// Matching is limited to exact names, suffixes and prefixes. Each field defaults to the
/// built-in table so a configuration file only needs to list the categories it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterRuleSet {
  /// Names excluded verbatim.
  pub exact_names: BTreeSet<String>,
  /// Extensions, including the leading dot, of files that are never bundled.
  pub extensions: BTreeSet<String>,
  /// Suffixes marking editor backup files.
  pub backup_suffixes: Vec<String>,
  /// Suffixes marking egg metadata directories.
  pub metadata_suffixes: Vec<String>,
  /// Prefixes of test modules.
  pub test_prefixes: Vec<String>,
  /// Fixed names of test support files.
  pub test_names: BTreeSet<String>,
}

impl Default for FilterRuleSet {
  fn default() -> Self {
    Self {
      exact_names: to_set(DEFAULT_EXACT_NAMES),
      extensions: to_set(DEFAULT_EXTENSIONS),
      backup_suffixes: vec!["~".into()],
      metadata_suffixes: vec![".egg-info".into()],
      test_prefixes: vec!["test_".into()],
      test_names: to_set(&["conftest.py"]),
    }
  }
}

const DEFAULT_EXACT_NAMES: &[&str] = &[
  // version control
  ".git",
  ".gitignore",
  ".gitattributes",
  ".gitmodules",
  ".hg",
  ".svn",
  // caches and build output
  "__pycache__",
  ".pytest_cache",
  ".mypy_cache",
  ".ruff_cache",
  ".tox",
  ".nox",
  ".eggs",
  "build",
  "dist",
  "htmlcov",
  ".coverage",
  // editors
  ".idea",
  ".vscode",
  ".vs",
  // tests
  "tests",
  "test",
  // virtual environments
  "venv",
  ".venv",
  "env",
  ".env",
  // documentation builds
  "_build",
  "site-build",
  // OS artifacts
  ".DS_Store",
  "Thumbs.db",
  "desktop.ini",
  // lint and CI configuration
  ".flake8",
  ".pylintrc",
  ".pre-commit-config.yaml",
  ".editorconfig",
  ".github",
  ".gitlab-ci.yml",
  ".travis.yml",
  "tox.ini",
  // release scripts
  "export_offline_installer.py",
  "publish_to_pip.py",
];

const DEFAULT_EXTENSIONS: &[&str] = &[
  ".pyc", ".pyo", ".pyd", ".tmp", ".temp", ".log", ".swp", ".swo", ".bak",
];

fn to_set(values: &[&str]) -> BTreeSet<String> {
  values.iter().map(|value| value.to_string()).collect()
}

impl FilterRuleSet {
  /// Return the first rule category matching `name`, checked in table order.
  pub fn matching_rule(&self, name: &str) -> Option<RuleMatch> {
    if self.exact_names.contains(name) {
      return Some(RuleMatch::ExactName);
    }

    if let Some(extension) = extension_of(name) {
      if self.extensions.contains(extension) {
        return Some(RuleMatch::Extension);
      }
    }

    if self.backup_suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
      return Some(RuleMatch::BackupSuffix);
    }

    if self
      .metadata_suffixes
      .iter()
      .any(|suffix| name.ends_with(suffix.as_str()))
    {
      return Some(RuleMatch::EggMetadata);
    }

    if self.test_names.contains(name)
      || self
        .test_prefixes
        .iter()
        .any(|prefix| name.starts_with(prefix.as_str()))
    {
      return Some(RuleMatch::TestFile);
    }

    None
  }
}

/// Extension of `name` including the leading dot, ignoring dotfiles such as `.env`.
fn extension_of(name: &str) -> Option<&str> {
  let index = name.rfind('.')?;
  (index > 0).then(|| &name[index..])
}

/// Entry filter combining the rule table with the essential file list.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
  rules: FilterRuleSet,
  essentials: BTreeSet<String>,
}

impl EntryFilter {
  /// Create a filter from a rule table and the names that are always bundled.
  pub fn new(rules: FilterRuleSet, essentials: impl IntoIterator<Item = String>) -> Self {
    Self {
      rules,
      essentials: essentials.into_iter().collect(),
    }
  }

  /// Whether `name` is on the essential list.
  pub fn is_essential(&self, name: &str) -> bool {
    self.essentials.contains(name)
  }
}

impl EntryInclusion for EntryFilter {
  fn is_excluded(&self, name: &str, path: &Path) -> bool {
    if path.is_dir() && is_empty_or_unreadable(path) {
      return true;
    }
    self.is_file_excluded(name)
  }

  fn is_file_excluded(&self, name: &str) -> bool {
    if self.is_essential(name) {
      return false;
    }
    self.rules.matching_rule(name).is_some()
  }
}

fn is_empty_or_unreadable(dir: &Path) -> bool {
  match fs::read_dir(dir) {
    Ok(mut entries) => entries.next().is_none(),
    Err(_) => true,
  }
}
