//! Pre-fetch installable archives so the bundle can be installed without network access.

use std::fs;
use std::io;
use std::path::Path;

use crate::models::DependencyArchiveSet;
use crate::process::{CommandRunner, CommandSpec};
use crate::project::PythonCommand;

/// Download the project's archives and their requirements into `bundle_dir/dir_name`.
///
/// Returns `None` when the download fails for any reason; the partially filled directory is
/// removed so the bundle never carries an incomplete dependency cache.
pub fn prefetch_dependencies<R: CommandRunner + ?Sized>(
  runner: &R,
  python: &PythonCommand,
  project_root: &Path,
  bundle_dir: &Path,
  dir_name: &str,
) -> Option<DependencyArchiveSet> {
  let deps_dir = bundle_dir.join(dir_name);
  log::info!("Downloading dependencies into {}", deps_dir.display());

  if let Err(err) = fs::create_dir_all(&deps_dir) {
    log::warn!("Failed to create {}: {}", deps_dir.display(), err);
    return None;
  }

  let spec = CommandSpec::python_module(python, "pip")
    .arg("download")
    .arg(".")
    .arg("--dest")
    .arg(deps_dir.as_os_str())
    .arg("--prefer-binary")
    .current_dir(project_root);

  let failure = match runner.run(&spec) {
    Ok(output) if output.success() => match list_archives(&deps_dir) {
      Ok(archives) => {
        log::info!("Downloaded {} dependency archive(s)", archives.len());
        for archive in &archives {
          log::debug!("  {}", archive);
        }
        return Some(DependencyArchiveSet {
          dir: deps_dir,
          archives,
        });
      }
      Err(err) => format!("failed to list downloaded archives: {err}"),
    },
    Ok(output) => format!(
      "`{}` exited with code {}",
      spec.display(),
      output.code.unwrap_or(-1)
    ),
    Err(err) => format!("failed to start `{}`: {}", spec.display(), err),
  };

  log::warn!("Dependency download failed ({failure}); continuing without offline dependencies");
  if let Err(err) = fs::remove_dir_all(&deps_dir) {
    log::warn!("Failed to remove {}: {}", deps_dir.display(), err);
  }
  None
}

fn list_archives(dir: &Path) -> io::Result<Vec<String>> {
  let mut archives = Vec::new();
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    if entry.file_type()?.is_file() {
      archives.push(entry.file_name().to_string_lossy().into_owned());
    }
  }
  archives.sort();
  Ok(archives)
}
