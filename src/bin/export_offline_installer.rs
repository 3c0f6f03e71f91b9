//! Build the offline installer bundle for the project in the current directory.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use offline_py_bundler::{BundleBuilder, BundleReport, ProjectContext, SystemRunner};

#[derive(Debug, Parser)]
#[command(
  name = "export-offline-installer",
  version,
  about = "Create an offline installer bundle for the project"
)]
struct Args {
  /// Project root; defaults to the current directory.
  #[arg(long)]
  project_dir: Option<PathBuf>,

  /// Python interpreter used for `pip download`.
  #[arg(long)]
  python: Option<String>,
}

fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  match run(Args::parse()) {
    Ok(report) => {
      log::info!("Offline installer created successfully!");
      log::info!("Installer location: {}", report.bundle_dir.display());
      if !report.has_dependencies() {
        log::warn!("No dependency archives bundled; install.py will need network access");
      }
      log::info!("To install, run in the installer directory:");
      log::info!(
        "  python {}",
        report
          .installer_path
          .file_name()
          .map(|name| name.to_string_lossy().into_owned())
          .unwrap_or_default()
      );
      ExitCode::SUCCESS
    }
    Err(err) => {
      log::error!("{:#}", err);
      ExitCode::FAILURE
    }
  }
}

fn run(args: Args) -> Result<BundleReport> {
  let root = match args.project_dir {
    Some(dir) => dir,
    None => env::current_dir().context("failed to determine the current directory")?,
  };
  let root = root
    .canonicalize()
    .with_context(|| format!("project directory {} not found", root.display()))?;

  let context = ProjectContext::discover(root, args.python);
  let mut builder = BundleBuilder::new(&context, &SystemRunner);
  if let Ok(exe) = env::current_exe() {
    builder = builder.skip_path(exe);
  }
  builder.build()
}
