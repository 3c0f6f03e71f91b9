//! Build, check and publish the package in the current directory.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use offline_py_bundler::{
  ProjectContext, ReleaseError, ReleasePipeline, SystemRunner, TerminalOperator,
};

#[derive(Debug, Parser)]
#[command(
  name = "publish-to-pypi",
  version,
  about = "Build the package and upload it to TestPyPI and/or PyPI"
)]
struct Args {
  /// Project root; defaults to the current directory.
  #[arg(long)]
  project_dir: Option<PathBuf>,

  /// Python interpreter used for pip, build and twine.
  #[arg(long)]
  python: Option<String>,
}

fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let args = Args::parse();
  let root = match args.project_dir {
    Some(dir) => dir,
    None => match env::current_dir() {
      Ok(dir) => dir,
      Err(err) => {
        log::error!("Failed to determine the current directory: {}", err);
        return ExitCode::FAILURE;
      }
    },
  };

  let context = ProjectContext::discover(root, args.python);
  match ReleasePipeline::new(&context, &SystemRunner, &TerminalOperator).run() {
    Ok(outcome) => {
      log::info!(
        "Publish flow complete ({}): staging uploaded: {}, production uploaded: {}",
        outcome.action,
        outcome.staging_uploaded,
        outcome.production_uploaded
      );
      ExitCode::SUCCESS
    }
    Err(ReleaseError::Interrupted) => {
      log::warn!("Interrupted by operator");
      ExitCode::FAILURE
    }
    Err(err) => {
      log::error!("{}", err);
      ExitCode::FAILURE
    }
  }
}
