//! Remove output of earlier builds.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Delete `dirs` and every path matching `egg_info_pattern` below `root`.
///
/// Paths that do not exist are skipped, so running this on a clean tree is a no-op.
/// Returns the paths that were removed.
pub fn clean_build_outputs(
    root: &Path,
    dirs: &[String],
    egg_info_pattern: &str,
) -> Result<Vec<PathBuf>> {
    let mut targets: Vec<PathBuf> = dirs.iter().map(|dir| root.join(dir)).collect();

    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        egg_info_pattern
    );
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => targets.push(path),
            Err(err) => log::warn!("Skipping unreadable path: {}", err),
        }
    }

    let mut removed = Vec::new();
    for target in targets {
        if remove_path(&target)? {
            log::info!("Removed: {}", target.display());
            removed.push(target);
        }
    }
    Ok(removed)
}

fn remove_path(path: &Path) -> std::io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
