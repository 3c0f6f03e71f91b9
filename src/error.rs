//! Error types for the release pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::release::Stage;

/// Result type alias for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Fatal conditions that abort the release pipeline
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// IO errors while cleaning or inspecting the project tree
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The packaging manifest is not present in the project root
    #[error("{} not found; run from the project root", .path.display())]
    MissingManifest {
        /// Expected manifest location
        path: PathBuf,
    },

    /// A required tool was missing and installing it failed
    #[error("failed to install required tool `{tool}`")]
    ToolInstall {
        /// Tool name as known to pip
        tool: String,
    },

    /// An external command exited unsuccessfully
    #[error("{stage} failed: `{command}` exited with {}", describe_code(.code))]
    CommandFailed {
        /// Pipeline stage that ran the command
        stage: Stage,
        /// Command line as displayed to the operator
        command: String,
        /// Exit code, absent when terminated by a signal
        code: Option<i32>,
    },

    /// An external command could not be started
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Command line as displayed to the operator
        command: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The build produced nothing to upload
    #[error("no build artifacts found in {}", .dir.display())]
    NoArtifacts {
        /// Directory that was inspected
        dir: PathBuf,
    },

    /// Reading an operator answer failed
    #[error("failed to read operator input: {0}")]
    Prompt(String),

    /// The operator interrupted the pipeline
    #[error("interrupted by operator")]
    Interrupted,

    /// A cleanup pattern was malformed
    #[error("invalid cleanup pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}
