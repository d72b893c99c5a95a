use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWrite, AsyncWriteExt},
    process::{Child, Command},
    time::{timeout, Instant},
};

use super::*;
use crate::str_interp::CommandVars;

/// Runs programs as plain child processes of a shell.
///
/// Enforces the time limit (wall clock) and, through `ulimit -v`, the memory
/// limit. Provides no isolation and does not measure memory usage.
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    shell: PathBuf,
    compile_time_limit: Duration,
    work_root: Option<PathBuf>,
}

impl Default for ProcessSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSandbox {
    const DEFAULT_SHELL: &str = "/bin/sh";
    const DEFAULT_COMPILE_TIME_LIMIT: Duration = Duration::from_secs(10);
    const INTERACTOR_INPUT_FILENAME: &str = ".interactor.in";

    pub fn new() -> Self {
        Self {
            shell: Self::DEFAULT_SHELL.into(),
            compile_time_limit: Self::DEFAULT_COMPILE_TIME_LIMIT,
            work_root: None,
        }
    }

    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn compile_time_limit(mut self, limit: Duration) -> Self {
        self.compile_time_limit = limit;
        self
    }

    /// Directory under which per-submission work dirs are created.
    /// Defaults to the system temp dir.
    pub fn work_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_root = Some(dir.into());
        self
    }

    fn new_workdir(&self) -> Result<TempDir, SandboxError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("saiten-");
        let dir = match &self.work_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .map_err(|e| SandboxError::io("Failed to create work root", e))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        };
        dir.map_err(|e| SandboxError::io("Failed to create work dir", e))
    }

    fn command(&self, cmd: &str, dir: &Path) -> Command {
        let mut c = Command::new(&self.shell);
        c.args(["-c", cmd]).current_dir(dir).kill_on_drop(true);
        c
    }

    fn spawn(&self, cmd: &str, dir: &Path, stdin: Stdio) -> Result<Child, SandboxError> {
        self.command(cmd, dir)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                command: cmd.to_owned(),
                source,
            })
    }

    fn with_memory_limit(cmd: &str, limits: Limits) -> String {
        match limits.memory {
            0 => cmd.to_owned(),
            kib => format!("ulimit -v {} 2>/dev/null; {}", kib, cmd),
        }
    }
}

fn program_vars(artifact: &Artifact) -> CommandVars {
    CommandVars::for_program(artifact.source_path(), artifact.path())
}

fn take_pipe<T>(pipe: Option<T>, context: &'static str) -> Result<T, SandboxError> {
    pipe.ok_or_else(|| SandboxError::io(context, io::ErrorKind::BrokenPipe.into()))
}

/// The other side closing its end early is a judging outcome, not an I/O failure.
fn ignore_broken_pipe<T>(res: io::Result<T>) -> io::Result<()> {
    match res {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e),
    }
}

async fn kill(proc: &mut Child) {
    proc.kill()
        .await
        .unwrap_or_else(|e| log::warn!("Failed to kill timed-out process: {:#}", e));
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn compile(
        &self,
        language: &dyn Language,
        source: &[u8],
        diagnostics: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<Compilation, SandboxError> {
        let workdir = self.new_workdir()?;
        let source_path = workdir.path().join(language.source_filename());
        let artifact_path = workdir.path().join(language.artifact_filename());
        tokio::fs::write(&source_path, source)
            .await
            .map_err(|e| SandboxError::io("Failed to write source file", e))?;

        let workdir = Arc::new(workdir);
        let artifact = Artifact::new(&artifact_path, &source_path).with_workdir(workdir.clone());

        let Some(template) = language.compile_command() else {
            return Ok(Compilation {
                outcome: ExitOutcome::Exited(0),
                artifact: Some(artifact),
                diagnostics: Vec::new(),
            })
        };
        let cmd = CommandVars::for_program(&source_path, &artifact_path).interp(template)?;
        log::debug!("Compiling: {}", cmd);

        // Merge stderr into stdout so diagnostics keep their order.
        let mut proc = self.spawn(&format!("exec 2>&1; {}", cmd), workdir.path(), Stdio::null())?;
        let mut output = take_pipe(proc.stdout.take(), "Failed to open compiler output")?;

        let mut captured = Vec::new();
        let res = timeout(self.compile_time_limit, async {
            let mut buf = [0u8; 4096];
            loop {
                let n = output.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                diagnostics.write_all(&buf[..n]).await?;
                captured.extend_from_slice(&buf[..n]);
            }
            diagnostics.flush().await?;
            proc.wait().await
        })
        .await;

        let outcome = match res {
            Err(_) => {
                kill(&mut proc).await;
                ExitOutcome::TimedOut
            }
            Ok(Err(e)) => return Err(SandboxError::io("Failed to communicate with compiler", e)),
            Ok(Ok(status)) => status.into(),
        };

        Ok(Compilation {
            outcome,
            artifact: outcome.is_success().then_some(artifact),
            diagnostics: captured,
        })
    }

    async fn execute(
        &self,
        language: &dyn Language,
        artifact: &Artifact,
        request: ExecRequest<'_>,
    ) -> Result<Execution, SandboxError> {
        let dir = artifact.dir();
        let cmd = program_vars(artifact).interp(language.run_command())?;
        let cmd = Self::with_memory_limit(&cmd, request.limits);

        let piped_input = match request.io_files {
            Some(files) => {
                tokio::fs::write(dir.join(&files.input), request.input)
                    .await
                    .map_err(|e| SandboxError::io("Failed to write input file", e))?;
                match tokio::fs::remove_file(dir.join(&files.output)).await {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => {
                        return Err(SandboxError::io("Failed to remove stale output file", e))
                    }
                    _ => (),
                }
                None
            }
            None => Some(request.input),
        };

        let stdin_cfg = match piped_input {
            Some(_) => Stdio::piped(),
            None => Stdio::null(),
        };
        let mut proc = self.spawn(&cmd, dir, stdin_cfg)?;
        let stdin = proc.stdin.take();
        let mut stdout = take_pipe(proc.stdout.take(), "Failed to open stdout")?;
        let mut stderr = take_pipe(proc.stderr.take(), "Failed to open stderr")?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let start_at = Instant::now();
        let res = timeout(request.limits.time, async {
            let feed_stdin = async move {
                if let (Some(mut stdin), Some(input)) = (stdin, piped_input) {
                    ignore_broken_pipe(stdin.write_all(input).await)?;
                }
                Ok::<_, io::Error>(())
            };
            tokio::try_join!(
                feed_stdin,
                tokio::io::copy(&mut stdout, &mut stdout_buf),
                tokio::io::copy(&mut stderr, &mut stderr_buf),
                proc.wait(),
            )
        })
        .await;
        let time_spent = start_at.elapsed();

        let outcome = match res {
            Err(_) => {
                kill(&mut proc).await;
                ExitOutcome::TimedOut
            }
            Ok(Err(e)) => return Err(SandboxError::io("Failed to communicate with subprocess", e)),
            Ok(Ok((_, _, _, status))) => status.into(),
        };

        let stdout = match request.io_files {
            Some(files) if outcome != ExitOutcome::TimedOut => {
                tokio::fs::read(dir.join(&files.output))
                    .await
                    .unwrap_or_else(|e| {
                        log::debug!("No output file '{}': {}", files.output, e);
                        Vec::new()
                    })
            }
            _ => stdout_buf,
        };

        Ok(Execution {
            outcome,
            stdout,
            stderr: stderr_buf,
            time_spent,
            memory_used: 0,
        })
    }

    async fn execute_interactive(
        &self,
        language: &dyn Language,
        artifact: &Artifact,
        interactor: &Interactor,
        request: ExecRequest<'_>,
    ) -> Result<InteractiveExecution, SandboxError> {
        let dir = artifact.dir();
        let input_path = dir.join(Self::INTERACTOR_INPUT_FILENAME);
        tokio::fs::write(&input_path, request.input)
            .await
            .map_err(|e| SandboxError::io("Failed to write interactor input", e))?;

        let vars = program_vars(artifact)
            .set("inputPath", &input_path)
            .set("interactorDir", &interactor.dir);
        let program_cmd = Self::with_memory_limit(&vars.interp(language.run_command())?, request.limits);
        let interactor_cmd = vars.interp(&interactor.command)?;

        let mut program = self.spawn(&program_cmd, dir, Stdio::piped())?;
        let mut judge = self.spawn(&interactor_cmd, dir, Stdio::piped())?;

        let mut program_in = take_pipe(program.stdin.take(), "Failed to open program stdin")?;
        let mut program_out = take_pipe(program.stdout.take(), "Failed to open program stdout")?;
        let mut program_err = take_pipe(program.stderr.take(), "Failed to open program stderr")?;
        let mut judge_in = take_pipe(judge.stdin.take(), "Failed to open interactor stdin")?;
        let mut judge_out = take_pipe(judge.stdout.take(), "Failed to open interactor stdout")?;
        let mut judge_err = take_pipe(judge.stderr.take(), "Failed to open interactor stderr")?;

        let mut program_err_buf = Vec::new();
        let mut judge_err_buf = Vec::new();

        let start_at = Instant::now();
        let res = timeout(request.limits.time, async {
            let to_judge = async move {
                ignore_broken_pipe(tokio::io::copy(&mut program_out, &mut judge_in).await)
            };
            let to_program = async move {
                ignore_broken_pipe(tokio::io::copy(&mut judge_out, &mut program_in).await)
            };
            tokio::try_join!(
                to_judge,
                to_program,
                tokio::io::copy(&mut program_err, &mut program_err_buf),
                tokio::io::copy(&mut judge_err, &mut judge_err_buf),
                program.wait(),
                judge.wait(),
            )
        })
        .await;
        let time_spent = start_at.elapsed();

        let (program_outcome, judge_outcome) = match res {
            Err(_) => {
                kill(&mut program).await;
                kill(&mut judge).await;
                (ExitOutcome::TimedOut, ExitOutcome::TimedOut)
            }
            Ok(Err(e)) => {
                return Err(SandboxError::io("Failed to communicate with interactor", e))
            }
            Ok(Ok((_, _, _, _, p, j))) => (p.into(), j.into()),
        };

        Ok(InteractiveExecution {
            program: Execution {
                outcome: program_outcome,
                stdout: Vec::new(),
                stderr: program_err_buf,
                time_spent,
                memory_used: 0,
            },
            interactor: judge_outcome,
            interactor_message: String::from_utf8_lossy(&judge_err_buf).into_owned(),
        })
    }
}
