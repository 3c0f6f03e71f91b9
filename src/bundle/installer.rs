//! Generate the standalone `install.py` shipped inside the bundle.
//!
//! The installer is a fixed Python program driven by a short block of constants. The only
//! inputs are the project identity and whether dependency archives were bundled, so the
//! rendered output can be checked without running Python.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::ProjectConfig;

const INSTALLER_HEADER: &str = r#"#!/usr/bin/env python3
"""
One-click installer generated by offline_py_bundler.

Run from inside the unpacked bundle directory:

    python install.py
"""

import os
import subprocess
import sys
import tempfile
"#;

const INSTALLER_BODY: &str = r#"

def run(args):
    print("Executing: " + " ".join(args))
    result = subprocess.call(args)
    if result != 0:
        print("Command failed with exit code: {}".format(result))
        return False
    return True


def pip(*args):
    return [sys.executable, "-m", "pip"] + list(args)


def normalize(name):
    return name.lower().replace("-", "_")


def install_offline(here):
    deps_dir = os.path.join(here, DEPENDENCIES_DIR)
    if not os.path.isdir(deps_dir):
        print("Dependency directory {} not found".format(DEPENDENCIES_DIR))
        return False

    archives = sorted(
        name for name in os.listdir(deps_dir)
        if os.path.isfile(os.path.join(deps_dir, name))
    )
    prefix = normalize(PROJECT_NAME)
    main = [name for name in archives if normalize(name).startswith(prefix)]
    supporting = [name for name in archives if name not in main]

    for name in supporting:
        if not run(pip("install", "--no-index", "--no-deps", os.path.join(deps_dir, name))):
            return False

    if not main:
        print("No {} archive bundled, installing from the bundle sources".format(PROJECT_NAME))
        return run(pip("install", "--no-index", "--no-deps", "."))

    for name in main:
        if not run(pip("install", "--no-index", "--no-deps", os.path.join(deps_dir, name))):
            return False
    return True


def install_online():
    methods = [
        ("pip install (local)", pip("install", ".")),
        ("pip install (editable)", pip("install", "-e", ".")),
        ("setup.py install", [sys.executable, "setup.py", "install"]),
    ]
    for label, command in methods:
        print("\nTrying: " + label)
        if run(command):
            print("Installation successful using: " + label)
            return True
        print("Failed: " + label)
    return False


def can_import(module):
    command = [sys.executable, "-c", "import " + module]
    return subprocess.call(command, cwd=tempfile.gettempdir()) == 0


def smoke_test():
    print("\nTesting installation...")
    if not can_import(IMPORT_NAME):
        # A package that cannot be imported is a failed install, not a warning.
        print("Import test failed: {} could not be imported".format(IMPORT_NAME))
        sys.exit(1)
    print("{} imported successfully".format(IMPORT_NAME))

    if OPTIONAL_DEPENDENCY:
        if can_import(OPTIONAL_DEPENDENCY):
            print("Optional dependency {} is available".format(OPTIONAL_DEPENDENCY))
        else:
            print("Warning: optional dependency {} is not installed".format(OPTIONAL_DEPENDENCY))

    print("Installation completed!")


def main():
    print("{} One-Click Installer".format(PROJECT_NAME))
    print("=" * 40)

    if sys.version_info < MIN_PYTHON:
        print("Error: Python {}.{} or higher is required".format(*MIN_PYTHON))
        sys.exit(1)
    print("Python version: " + sys.version)

    here = os.path.dirname(os.path.abspath(__file__))
    os.chdir(here)

    installed = False
    if OFFLINE_DEPENDENCIES:
        print("\nTrying: offline install from " + DEPENDENCIES_DIR)
        installed = install_offline(here)
        if installed:
            print("Offline installation successful")
        else:
            print("Offline installation failed, trying network installation")

    if not installed:
        installed = install_online()

    if not installed:
        print("\nAll installation methods failed!")
        print("Manual installation options:")
        print("1. Copy the {} package into your site-packages directory".format(IMPORT_NAME))
        print("2. Add this directory to your PYTHONPATH")
        sys.exit(1)

    smoke_test()


if __name__ == "__main__":
    main()
"#;

/// Inputs of the generated bootstrap installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerScript {
  /// Project name, matched against archive file names.
  pub project_name: String,
  /// Module imported by the smoke test.
  pub import_name: String,
  /// Optional module whose absence only produces a warning.
  pub optional_dependency: Option<String>,
  /// Minimum interpreter version.
  pub min_python: (u32, u32),
  /// Dependency directory relative to the bundle root.
  pub dependencies_dir: String,
  /// Attempt the offline installation first.
  pub offline: bool,
}

impl InstallerScript {
  /// Installer for the configured project; `has_dependencies` enables the offline stage.
  pub fn from_config(config: &ProjectConfig, has_dependencies: bool) -> Self {
    Self {
      project_name: config.project_name.clone(),
      import_name: config.import_name.clone(),
      optional_dependency: config.optional_dependency.clone(),
      min_python: config.min_python,
      dependencies_dir: config.dependencies_dir_name.clone(),
      offline: has_dependencies,
    }
  }

  /// Render the full Python source.
  pub fn render(&self) -> String {
    let optional = self
      .optional_dependency
      .as_deref()
      .map_or_else(|| "None".to_string(), python_str);
    let (major, minor) = self.min_python;

    format!(
      "{header}\nPROJECT_NAME = {project}\nIMPORT_NAME = {import}\nOPTIONAL_DEPENDENCY = {optional}\nDEPENDENCIES_DIR = {deps}\nMIN_PYTHON = ({major}, {minor})\nOFFLINE_DEPENDENCIES = {offline}\n{body}",
      header = INSTALLER_HEADER,
      project = python_str(&self.project_name),
      import = python_str(&self.import_name),
      deps = python_str(&self.dependencies_dir),
      offline = if self.offline { "True" } else { "False" },
      body = INSTALLER_BODY,
    )
  }

  /// Write the installer to `path`, marking it executable on Unix.
  pub fn write(&self, path: &Path) -> Result<()> {
    fs::write(path, self.render())
      .with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to mark {} executable", path.display()))?;
    }

    Ok(())
  }
}

/// Quote `value` as a string literal; JSON string escapes are valid Python escapes.
fn python_str(value: &str) -> String {
  Value::String(value.to_string()).to_string()
}
