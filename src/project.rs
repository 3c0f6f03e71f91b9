//! Project root, interpreter and configuration shared by both pipelines.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;

/// Python interpreter command used for every external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonCommand(String);

impl PythonCommand {
  /// Wrap an explicit interpreter command.
  pub fn new(command: impl Into<String>) -> Self {
    Self(command.into())
  }

  /// Pick the interpreter for the current platform.
  ///
  /// Windows installs expose `python`, most Unix systems only `python3`. When the preferred
  /// name is not on `PATH` the other one is tried before settling on the preferred default.
  pub fn detect() -> Self {
    let (preferred, fallback) = if cfg!(windows) {
      ("python", "python3")
    } else {
      ("python3", "python")
    };

    match which::which(preferred) {
      Ok(path) => {
        log::debug!("Found {} at {}", preferred, path.display());
        Self::new(preferred)
      }
      Err(_) if which::which(fallback).is_ok() => {
        log::debug!("{} not on PATH, using {}", preferred, fallback);
        Self::new(fallback)
      }
      Err(_) => Self::new(preferred),
    }
  }

  /// Resolve the interpreter from configuration, falling back to detection.
  pub fn from_config(config: &ProjectConfig) -> Self {
    match config.python_command.as_deref().map(str::trim) {
      Some(command) if !command.is_empty() => Self::new(command),
      _ => Self::detect(),
    }
  }

  /// Command name or path passed to the process spawner.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for PythonCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Everything a pipeline needs to know about the project it operates on.
#[derive(Debug, Clone)]
pub struct ProjectContext {
  /// Root directory of the Python project.
  pub root: PathBuf,
  /// Loaded project configuration.
  pub config: ProjectConfig,
  /// Interpreter used for pip, build and twine invocations.
  pub python: PythonCommand,
}

impl ProjectContext {
  /// Build a context from explicit parts.
  pub fn new(root: impl Into<PathBuf>, config: ProjectConfig, python: PythonCommand) -> Self {
    Self {
      root: root.into(),
      config,
      python,
    }
  }

  /// Discover configuration in `root` and resolve the interpreter.
  pub fn discover(root: impl Into<PathBuf>, python_override: Option<String>) -> Self {
    let root = root.into();
    let config = ProjectConfig::discover(&root);
    let python = match python_override {
      Some(command) => PythonCommand::new(command),
      None => PythonCommand::from_config(&config),
    };
    Self::new(root, config, python)
  }

  /// Path of the packaging manifest (`setup.py`).
  pub fn manifest_path(&self) -> PathBuf {
    self.root.join(&self.config.manifest_file)
  }

  /// Directory the build front-end writes distributables into.
  pub fn dist_dir(&self) -> PathBuf {
    self.root.join(&self.config.dist_dir)
  }

  /// Project root as a borrowed path.
  pub fn root(&self) -> &Path {
    &self.root
  }
}
