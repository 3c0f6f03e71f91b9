//! Operator-gated uploads to the staging and production indexes.

use std::path::PathBuf;

use super::{Stage, run_checked};
use crate::error::Result;
use crate::models::{PublishAction, ReleaseOutcome};
use crate::process::{CommandRunner, CommandSpec};
use crate::project::ProjectContext;
use crate::prompt::Operator;

/// Ask the operator what to publish and perform the confirmed uploads.
pub fn publish<R, O>(
    runner: &R,
    operator: &O,
    context: &ProjectContext,
    version: &str,
    artifacts: &[PathBuf],
) -> Result<ReleaseOutcome>
where
    R: CommandRunner + ?Sized,
    O: Operator + ?Sized,
{
    let action = operator.select_action()?;
    let mut outcome = ReleaseOutcome {
        version: version.to_string(),
        action,
        staging_uploaded: false,
        production_uploaded: false,
    };

    let uploader = Uploader {
        runner,
        operator,
        context,
        version,
        artifacts,
    };

    match action {
        PublishAction::StagingOnly => {
            outcome.staging_uploaded = uploader.staging()?;
        }
        PublishAction::StagingThenProduction => {
            outcome.staging_uploaded = uploader.staging()?;
            if outcome.staging_uploaded {
                operator.pause("Press Enter to continue publishing to PyPI...")?;
                outcome.production_uploaded = uploader.production()?;
            }
        }
        PublishAction::ProductionOnly => {
            outcome.production_uploaded = uploader.production()?;
        }
        PublishAction::Abort => log::info!("Leaving the publish flow"),
    }

    Ok(outcome)
}

struct Uploader<'a, R: ?Sized, O: ?Sized> {
    runner: &'a R,
    operator: &'a O,
    context: &'a ProjectContext,
    version: &'a str,
    artifacts: &'a [PathBuf],
}

impl<R: CommandRunner + ?Sized, O: Operator + ?Sized> Uploader<'_, R, O> {
    fn staging(&self) -> Result<bool> {
        let config = &self.context.config;
        log::info!("Uploading to TestPyPI");
        log::warn!("Make sure a TestPyPI API token is configured");

        if !self
            .operator
            .confirm("Upload to TestPyPI for testing?")?
        {
            log::info!("Skipping TestPyPI upload");
            return Ok(false);
        }

        let spec = CommandSpec::python_module(&self.context.python, "twine")
            .arg("upload")
            .arg("--repository")
            .arg(&config.staging_repository)
            .args(self.artifacts)
            .current_dir(self.context.root());
        run_checked(self.runner, Stage::StagingUpload, &spec)?;

        log::info!("Uploaded to TestPyPI: {}", config.index_url(true));
        Ok(true)
    }

    fn production(&self) -> Result<bool> {
        let config = &self.context.config;
        log::info!("Uploading to PyPI");
        log::warn!("Make sure a PyPI API token is configured");
        log::info!("Current version: {}", self.version);

        if !self.operator.confirm("Publish to PyPI?")? {
            log::info!("Publishing to PyPI cancelled");
            return Ok(false);
        }

        let spec = CommandSpec::python_module(&self.context.python, "twine")
            .arg("upload")
            .args(self.artifacts)
            .current_dir(self.context.root());
        run_checked(self.runner, Stage::ProductionUpload, &spec)?;

        log::info!("Published to PyPI: {}", config.index_url(false));
        log::info!(
            "Install with: pip install {}=={}",
            config.distribution_name,
            self.version
        );
        Ok(true)
    }
}
