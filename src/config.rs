//! Project configuration loader describing the package and its release layout.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::selection::FilterRuleSet;

/// File name searched for in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "release.config.json";

/// Discoverable project configuration describing the package, bundle layout and tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name used for bundle naming and artifact matching.
    pub project_name: String,
    /// Distribution name as published on the package index.
    pub distribution_name: String,
    /// Module name imported by the installer smoke test.
    pub import_name: String,
    /// Optional dependency whose import is checked after installation.
    pub optional_dependency: Option<String>,
    /// Interpreter command; detected per platform when unset.
    pub python_command: Option<String>,
    /// Minimum interpreter version required by the generated installer.
    pub min_python: (u32, u32),
    /// Directory name of the offline bundle inside the project root.
    pub bundle_dir_name: String,
    /// Append a timestamp to the bundle directory name.
    pub timestamped_bundle: bool,
    /// Subdirectory of the bundle receiving pre-fetched archives.
    pub dependencies_dir_name: String,
    /// File name of the generated bootstrap installer.
    pub installer_file_name: String,
    /// Packaging manifest the version is read from.
    pub manifest_file: String,
    /// Output directory of the build front-end.
    pub dist_dir: String,
    /// Build output directories removed before each release build.
    pub build_dirs: Vec<String>,
    /// Pattern matching egg-metadata directories removed before each build.
    pub egg_info_pattern: String,
    /// Python tools the release pipeline needs installed.
    pub required_tools: Vec<String>,
    /// Repository name of the staging index in the upload tool's configuration.
    pub staging_repository: String,
    /// File names always copied into the bundle.
    pub essential_files: Vec<String>,
    /// Exclusion rules applied while copying the project.
    pub rules: FilterRuleSet,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: "pyscript_util".into(),
            distribution_name: "pyscript-util".into(),
            import_name: "pyscript_util".into(),
            optional_dependency: None,
            python_command: None,
            min_python: (3, 6),
            bundle_dir_name: "pyscript_util_offline_installer".into(),
            timestamped_bundle: false,
            dependencies_dir_name: "dependencies".into(),
            installer_file_name: "install.py".into(),
            manifest_file: "setup.py".into(),
            dist_dir: "dist".into(),
            build_dirs: vec!["build".into(), "dist".into()],
            egg_info_pattern: "*.egg-info".into(),
            required_tools: vec!["twine".into(), "build".into()],
            staging_repository: "testpypi".into(),
            essential_files: default_essential_files(),
            rules: FilterRuleSet::default(),
        }
    }
}

fn default_essential_files() -> Vec<String> {
    [
        "setup.py",
        "setup.cfg",
        "pyproject.toml",
        "MANIFEST.in",
        "LICENSE",
        "LICENSE.txt",
        "README.md",
        "README.rst",
        "requirements.txt",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl ProjectConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// A missing file yields the defaults. A file that fails to parse also yields the defaults,
    /// with a warning so the operator notices the ignored settings.
    pub fn discover(project_root: &Path) -> Self {
        let candidate = project_root.join(DEFAULT_CONFIG_FILE);
        if !candidate.is_file() {
            return Self::default();
        }
        Self::from_path(&candidate).unwrap_or_else(|| {
            log::warn!(
                "Ignoring {}: not a valid configuration file",
                candidate.display()
            );
            Self::default()
        })
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Bundle directory name for this run, with the timestamp suffix when enabled.
    pub fn bundle_dir_name_at(&self, now: chrono::NaiveDateTime) -> String {
        if self.timestamped_bundle {
            format!("{}_{}", self.bundle_dir_name, now.format("%Y%m%d_%H%M%S"))
        } else {
            self.bundle_dir_name.clone()
        }
    }

    /// URL of the project page on the staging or production index.
    pub fn index_url(&self, staging: bool) -> String {
        let host = if staging { "test.pypi.org" } else { "pypi.org" };
        format!("https://{}/project/{}/", host, self.distribution_name)
    }
}
