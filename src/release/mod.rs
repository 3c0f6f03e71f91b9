//! Build-check-upload pipeline for publishing the package.
//!
//! Stages run strictly in order: tool check, clean, build, quality check and the publish
//! decision. Any failing stage aborts the run; declining an upload does not.

pub mod artifacts;
pub mod clean;
pub mod publish;
pub mod tools;
pub mod version;

use std::fmt;

use crate::error::{ReleaseError, Result};
use crate::models::ReleaseOutcome;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::project::ProjectContext;
use crate::prompt::Operator;

/// Pipeline stage, used to attribute command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Verifying and installing required tools.
    ToolCheck,
    /// Removing earlier build output.
    Clean,
    /// Running the build front-end.
    Build,
    /// Validating the built artifacts.
    QualityCheck,
    /// Waiting for the operator's upload choice.
    PublishDecision,
    /// Uploading to the staging index.
    StagingUpload,
    /// Uploading to the production index.
    ProductionUpload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ToolCheck => "tool check",
            Self::Clean => "clean",
            Self::Build => "build",
            Self::QualityCheck => "quality check",
            Self::PublishDecision => "publish decision",
            Self::StagingUpload => "staging upload",
            Self::ProductionUpload => "production upload",
        };
        f.write_str(label)
    }
}

/// Run `spec` and turn spawn errors and nonzero exits into [`ReleaseError`]s.
pub(crate) fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    stage: Stage,
    spec: &CommandSpec,
) -> Result<CommandOutput> {
    let output = runner.run(spec).map_err(|source| ReleaseError::Spawn {
        command: spec.display(),
        source,
    })?;
    if !output.success() {
        log::error!("Command failed: {}", spec.display());
        if !output.stderr.trim().is_empty() {
            log::error!("{}", output.stderr.trim());
        }
        return Err(ReleaseError::CommandFailed {
            stage,
            command: spec.display(),
            code: output.code,
        });
    }
    Ok(output)
}

/// Release pipeline bound to a project, a process runner and an operator.
pub struct ReleasePipeline<'a, R: CommandRunner + ?Sized, O: Operator + ?Sized> {
    context: &'a ProjectContext,
    runner: &'a R,
    operator: &'a O,
}

impl<'a, R: CommandRunner + ?Sized, O: Operator + ?Sized> ReleasePipeline<'a, R, O> {
    /// Create a pipeline for `context`.
    pub fn new(context: &'a ProjectContext, runner: &'a R, operator: &'a O) -> Self {
        Self {
            context,
            runner,
            operator,
        }
    }

    /// Run every stage in order.
    pub fn run(&self) -> Result<ReleaseOutcome> {
        let context = self.context;
        let manifest = context.manifest_path();
        if !manifest.is_file() {
            return Err(ReleaseError::MissingManifest { path: manifest });
        }

        let version = version::read_version(&manifest);
        log::info!(
            "Releasing {} {} using Python command: {}",
            context.config.project_name,
            version,
            context.python
        );

        log::info!("[{}] Checking release tools...", Stage::ToolCheck);
        tools::ensure_tools(self.runner, &context.python, &context.config.required_tools)?;

        log::info!("[{}] Cleaning build directories...", Stage::Clean);
        clean::clean_build_outputs(
            context.root(),
            &context.config.build_dirs,
            &context.config.egg_info_pattern,
        )?;

        log::info!("[{}] Building package...", Stage::Build);
        artifacts::build_distributions(self.runner, context)?;

        log::info!("[{}] Checking package quality...", Stage::QualityCheck);
        let built = artifacts::check_distributions(self.runner, context)?;

        log::info!("[{}] Choosing publish target...", Stage::PublishDecision);
        let outcome = publish::publish(self.runner, self.operator, context, &version, &built)?;
        log::info!("Release pipeline finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::models::PublishAction;
    use crate::project::PythonCommand;
    use crate::testing::{RecordingRunner, ScriptedOperator};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn project(root: &Path) -> ProjectContext {
        fs::write(
            root.join("setup.py"),
            "setup(name='pyscript-util', version='0.4.2')",
        )
        .unwrap();
        ProjectContext::new(root, ProjectConfig::default(), PythonCommand::new("python3"))
    }

    /// Runner whose build step drops a wheel into `dist/` and whose other commands succeed.
    fn building_runner(root: &Path) -> RecordingRunner {
        let dist = root.join("dist");
        RecordingRunner::with(move |spec| {
            if spec.has_arg("build") && !spec.has_arg("show") && !spec.has_arg("install") {
                fs::create_dir_all(&dist)?;
                fs::write(dist.join("pyscript_util-0.4.2-py3-none-any.whl"), "whl")?;
            }
            Ok(CommandOutput::with_code(0))
        })
    }

    #[test]
    fn staging_then_production_uploads_both() {
        let temp = tempdir().unwrap();
        let context = project(temp.path());
        let runner = building_runner(temp.path());
        let operator = ScriptedOperator::new(PublishAction::StagingThenProduction, &[true, true]);

        let outcome = ReleasePipeline::new(&context, &runner, &operator).run().unwrap();

        assert_eq!(outcome.version, "0.4.2");
        assert!(outcome.staging_uploaded);
        assert!(outcome.production_uploaded);
        assert_eq!(operator.pauses(), 1);

        let commands = runner.commands();
        let wheel = temp.path().join("dist/pyscript_util-0.4.2-py3-none-any.whl");
        assert_eq!(commands, vec![
            "python3 -m pip show twine".to_string(),
            "python3 -m pip show build".to_string(),
            "python3 -m build".to_string(),
            format!("python3 -m twine check {}", wheel.display()),
            format!(
                "python3 -m twine upload --repository testpypi {}",
                wheel.display()
            ),
            format!("python3 -m twine upload {}", wheel.display()),
        ]);
    }

    #[test]
    fn declining_staging_skips_production() {
        let temp = tempdir().unwrap();
        let context = project(temp.path());
        let runner = building_runner(temp.path());
        let operator = ScriptedOperator::new(PublishAction::StagingThenProduction, &[false]);

        let outcome = ReleasePipeline::new(&context, &runner, &operator).run().unwrap();

        assert!(!outcome.staging_uploaded);
        assert!(!outcome.production_uploaded);
        assert_eq!(operator.questions().len(), 1);
        assert!(!runner.commands().iter().any(|cmd| cmd.contains("upload")));
    }

    #[test]
    fn build_failure_aborts_before_quality_check() {
        let temp = tempdir().unwrap();
        let context = project(temp.path());
        let runner = RecordingRunner::with(|spec| {
            let code = if spec.display() == "python3 -m build" { 1 } else { 0 };
            Ok(CommandOutput::with_code(code))
        });
        let operator = ScriptedOperator::new(PublishAction::ProductionOnly, &[true]);

        let err = ReleasePipeline::new(&context, &runner, &operator)
            .run()
            .unwrap_err();

        assert!(matches!(
            err,
            ReleaseError::CommandFailed {
                stage: Stage::Build,
                code: Some(1),
                ..
            }
        ));
        assert_eq!(runner.commands().last().unwrap(), "python3 -m build");
        assert!(operator.questions().is_empty());
    }

    #[test]
    fn empty_dist_is_fatal() {
        let temp = tempdir().unwrap();
        let context = project(temp.path());
        let runner = RecordingRunner::succeeding();
        let operator = ScriptedOperator::new(PublishAction::StagingOnly, &[true]);

        let err = ReleasePipeline::new(&context, &runner, &operator)
            .run()
            .unwrap_err();

        assert!(matches!(err, ReleaseError::NoArtifacts { .. }));
        assert!(!runner.commands().iter().any(|cmd| cmd.contains("twine")));
    }

    #[test]
    fn missing_manifest_stops_before_any_command() {
        let temp = tempdir().unwrap();
        let context = ProjectContext::new(
            temp.path(),
            ProjectConfig::default(),
            PythonCommand::new("python3"),
        );
        let runner = RecordingRunner::succeeding();
        let operator = ScriptedOperator::new(PublishAction::Abort, &[]);

        let err = ReleasePipeline::new(&context, &runner, &operator)
            .run()
            .unwrap_err();

        assert!(matches!(err, ReleaseError::MissingManifest { .. }));
        assert!(runner.commands().is_empty());
    }
}
