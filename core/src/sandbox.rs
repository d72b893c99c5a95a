//! Boundary between a problem and the environment that compiles and runs
//! submissions.

pub mod process;

pub use process::ProcessSandbox;

use std::{
    fmt, io,
    path::{Path, PathBuf},
    process::ExitStatus,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::AsyncWrite;

use crate::str_interp::InterpError;

/// Toolchain selection for a submission.
pub trait Language: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// File name the source code is stored under, e.g. `Main.cpp`.
    fn source_filename(&self) -> &str;

    /// File name of the compiled program. Interpreted languages use the source file name.
    fn artifact_filename(&self) -> &str;

    /// `None` when the language needs no compilation.
    fn compile_command(&self) -> Option<&str>;

    fn run_command(&self) -> &str;
}

/// Compiled program, owned by the sandbox that produced it.
#[derive(Debug, Clone)]
pub struct Artifact {
    path: PathBuf,
    source_path: PathBuf,
    _workdir: Option<Arc<TempDir>>,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_path: source_path.into(),
            _workdir: None,
        }
    }

    /// Keeps `workdir` alive as long as any clone of this artifact exists.
    pub fn with_workdir(mut self, workdir: Arc<TempDir>) -> Self {
        self._workdir = Some(workdir);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    pub async fn open(&self) -> io::Result<tokio::fs::File> {
        tokio::fs::File::open(&self.path).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub time: Duration,
    /// KiB, 0 = unlimited
    pub memory: u64,
}

/// File names used instead of stdin/stdout by file-based problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoFiles {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecRequest<'a> {
    pub input: &'a [u8],
    pub limits: Limits,
    pub io_files: Option<&'a IoFiles>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled,
    TimedOut,
    MemoryExceeded,
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitOutcome::Exited(code),
            None => ExitOutcome::Signaled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compilation {
    pub outcome: ExitOutcome,
    /// `Some` iff compilation succeeded.
    pub artifact: Option<Artifact>,
    /// Everything the compiler printed.
    pub diagnostics: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: ExitOutcome,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub time_spent: Duration,
    /// KiB, 0 when the sandbox cannot measure it
    pub memory_used: u64,
}

/// Judge process of an interactive problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interactor {
    /// Command template. Besides the program variables it may use
    /// `#{inputPath}` and `#{interactorDir}`.
    pub command: String,
    /// Where the interactor's own files live.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveExecution {
    pub program: Execution,
    pub interactor: ExitOutcome,
    /// What the interactor printed on stderr.
    pub interactor_message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Invalid command template: {0}")]
    Template(#[from] InterpError),

    #[error("Sandbox unavailable: {0}")]
    Unavailable(String),
}

impl SandboxError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        SandboxError::Io { context, source }
    }
}

/// Isolated environment that compiles and runs untrusted programs.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Compiles `source`, streaming compiler output into `diagnostics` as it is produced.
    async fn compile(
        &self,
        language: &dyn Language,
        source: &[u8],
        diagnostics: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<Compilation, SandboxError>;

    async fn execute(
        &self,
        language: &dyn Language,
        artifact: &Artifact,
        request: ExecRequest<'_>,
    ) -> Result<Execution, SandboxError>;

    /// Runs the program against `interactor`, wiring each one's stdout to the other's stdin.
    async fn execute_interactive(
        &self,
        language: &dyn Language,
        artifact: &Artifact,
        interactor: &Interactor,
        request: ExecRequest<'_>,
    ) -> Result<InteractiveExecution, SandboxError>;
}
