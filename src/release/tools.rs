//! Make sure the Python tools the pipeline shells out to are installed.

use crate::error::{ReleaseError, Result};
use crate::process::{CommandRunner, CommandSpec};
use crate::project::PythonCommand;

/// Query each tool with `pip show` and install the ones that are missing.
///
/// A missing tool is not an error by itself; failing to install it is.
pub fn ensure_tools<R: CommandRunner + ?Sized>(
    runner: &R,
    python: &PythonCommand,
    tools: &[String],
) -> Result<()> {
    for tool in tools {
        if is_installed(runner, python, tool) {
            log::debug!("{} is installed", tool);
            continue;
        }

        log::warn!("Missing tool {}, installing...", tool);
        let install = CommandSpec::python_module(python, "pip")
            .arg("install")
            .arg(tool);
        match runner.run(&install) {
            Ok(output) if output.success() => log::info!("Installed {}", tool),
            Ok(_) => return Err(ReleaseError::ToolInstall { tool: tool.clone() }),
            Err(err) => {
                log::error!("Failed to start `{}`: {}", install.display(), err);
                return Err(ReleaseError::ToolInstall { tool: tool.clone() });
            }
        }
    }

    log::info!("Release tools ready");
    Ok(())
}

fn is_installed<R: CommandRunner + ?Sized>(runner: &R, python: &PythonCommand, tool: &str) -> bool {
    let query = CommandSpec::python_module(python, "pip").arg("show").arg(tool);
    match runner.run(&query) {
        Ok(output) => output.success(),
        Err(err) => {
            log::warn!("Failed to query {}: {}", tool, err);
            false
        }
    }
}
