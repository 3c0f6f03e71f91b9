#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod bundle;
pub mod config;
pub mod error;
pub mod models;
pub mod process;
pub mod project;
pub mod prompt;
pub mod release;
pub mod selection;

#[cfg(test)]
mod testing;

pub use builder::BundleBuilder;
pub use config::ProjectConfig;
pub use error::ReleaseError;
pub use models::{BundleReport, DependencyArchiveSet, PublishAction, ReleaseOutcome};
pub use process::{CommandRunner, SystemRunner};
pub use project::{ProjectContext, PythonCommand};
pub use prompt::{Operator, TerminalOperator};
pub use release::ReleasePipeline;
pub use selection::{EntryFilter, EntryInclusion, FilterRuleSet};
