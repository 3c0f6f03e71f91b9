//! Blocking execution of external commands.
//!
//! Every pipeline step talks to pip, build and twine through [`CommandRunner`], which keeps
//! the stage logic independent of how processes are spawned.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::project::PythonCommand;

/// Description of an external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments passed verbatim, without shell expansion.
    pub args: Vec<OsString>,
    /// Working directory, inherited when unset.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Create `<python> -m <module>`.
    pub fn python_module(python: &PythonCommand, module: &str) -> Self {
        Self::new(python.as_str()).arg("-m").arg(module)
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Command line as shown to the operator.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// True when the arguments contain `needle`.
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|arg| arg == needle)
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited with `code`.
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes commands to completion.
pub trait CommandRunner {
    /// Run `spec`, blocking until it exits. Spawn failures are returned as errors; a
    /// nonzero exit is reported through [`CommandOutput::code`].
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// Runner spawning real processes with captured output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        log::info!("Executing command: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let output = command.output()?;
        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        for line in result.stdout.lines() {
            log::debug!("  {}", line);
        }
        for line in result.stderr.lines() {
            log::debug!("  stderr: {}", line);
        }
        log::info!(
            "Command completed with exit code: {}",
            result
                .code
                .map_or_else(|| "none".to_string(), |code| code.to_string())
        );

        Ok(result)
    }
}
