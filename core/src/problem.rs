//! The contract a judged task implements, and the per-submission task that
//! drives it.

use std::{fmt, io, path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
    task::JoinHandle,
};

use crate::content::{Attachment, Content};
use crate::sandbox::{Artifact, ExitOutcome, IoFiles, Language, Limits, Sandbox, SandboxError};
use crate::status::Status;
use crate::testset::TestsetOutline;
use crate::verdict::{FeedbackType, VerdictName};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Compile error ({outcome:?})")]
    Rejected {
        outcome: ExitOutcome,
        diagnostics: String,
    },

    #[error("Failed to read source code: {0}")]
    ReadSource(#[source] io::Error),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Cannot read compiled artifact '{path}': {source}")]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read test data '{path}': {source}")]
    TestData {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Judge task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What a running judgement reports while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Compiling {
        language: String,
    },
    Compiled {
        success: bool,
        diagnostics: String,
    },
    TestcaseStarted {
        index: usize,
        total: usize,
        testset: String,
        name: String,
    },
    TestcaseFinished {
        index: usize,
        total: usize,
        testset: String,
        verdict: VerdictName,
        time_spent: Duration,
    },
    Message(String),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Progress::*;
        match self {
            Compiling { language } => write!(f, "Compiling ({})", language),
            Compiled { success: true, .. } => write!(f, "Compiled"),
            Compiled { success: false, .. } => write!(f, "Compilation failed"),
            TestcaseStarted {
                index,
                total,
                testset,
                name,
            } => write!(f, "Running test {}/{} ({}: {})", index, total, testset, name),
            TestcaseFinished {
                index,
                total,
                verdict,
                time_spent,
                ..
            } => write!(
                f,
                "Test {}/{}: {} [{}ms]",
                index,
                total,
                verdict,
                time_spent.as_millis()
            ),
            Message(msg) => write!(f, "{}", msg),
        }
    }
}

/// Fire-and-forget sender of [`Progress`]. Never blocks.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<Progress>>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn discard() -> Self {
        Self::default()
    }

    pub fn emit(&self, progress: Progress) {
        if let Some(tx) = &self.tx {
            // Nobody listening is fine.
            let _ = tx.send(progress);
        }
    }
}

/// A judged task.
#[async_trait]
pub trait Problem: Send + Sync {
    fn name(&self) -> &str;

    fn titles(&self) -> &[Content];

    fn statements(&self) -> &[Content];

    fn html_statements(&self) -> Vec<&Content> {
        self.statements().iter().filter(|c| c.is_html()).collect()
    }

    fn pdf_statements(&self) -> Vec<&Content> {
        self.statements().iter().filter(|c| c.is_pdf()).collect()
    }

    /// KiB
    fn memory_limit(&self) -> u64;

    fn time_limit(&self) -> Duration;

    fn limits(&self) -> Limits {
        Limits {
            time: self.time_limit(),
            memory: self.memory_limit(),
        }
    }

    /// `None` when the program talks through stdin/stdout.
    fn input_output_files(&self) -> Option<&IoFiles>;

    fn interactive(&self) -> bool;

    fn languages(&self) -> Vec<Arc<dyn Language>>;

    fn attachments(&self) -> &[Attachment];

    fn tags(&self) -> &[String];

    fn feedback_type(&self) -> FeedbackType {
        FeedbackType::CF
    }

    /// Testsets and their max scores, known before anything runs.
    fn outline(&self) -> Vec<TestsetOutline>;

    async fn compile(
        &self,
        sandbox: &dyn Sandbox,
        language: &dyn Language,
        source: &mut (dyn AsyncRead + Send + Unpin),
        diagnostics: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<Artifact, CompileError>;

    /// Runs every testcase, testsets in order then testcases in order.
    async fn run(
        &self,
        sandbox: &dyn Sandbox,
        language: &dyn Language,
        artifact: &Artifact,
        progress: &ProgressSink,
    ) -> Result<Status, RunError>;
}

/// A submission being judged on its own task.
///
/// `progress` closes when the task finishes, whatever the outcome.
pub struct JudgeTask {
    pub progress: mpsc::UnboundedReceiver<Progress>,
    handle: JoinHandle<Result<Status, JudgeError>>,
}

impl JudgeTask {
    pub async fn wait(self) -> Result<Status, JudgeError> {
        self.handle.await?
    }
}

/// Compiles and runs `source` on a new tokio task.
pub fn spawn_judge(
    problem: Arc<dyn Problem>,
    sandbox: Arc<dyn Sandbox>,
    language: Arc<dyn Language>,
    source: Vec<u8>,
) -> JudgeTask {
    let (progress, rx) = ProgressSink::channel();
    let handle = tokio::spawn(async move {
        judge_submission(&*problem, &*sandbox, &*language, &source, &progress).await
    });
    JudgeTask {
        progress: rx,
        handle,
    }
}

/// Compile then run. A submission that does not compile still gets a
/// [`Status`] with `compiled == false`.
pub async fn judge_submission(
    problem: &dyn Problem,
    sandbox: &dyn Sandbox,
    language: &dyn Language,
    source: &[u8],
    progress: &ProgressSink,
) -> Result<Status, JudgeError> {
    progress.emit(Progress::Compiling {
        language: language.name().to_owned(),
    });

    let mut diagnostics = Vec::new();
    let mut source = source;
    let compiled = problem
        .compile(sandbox, language, &mut source, &mut diagnostics)
        .await;

    let artifact = match compiled {
        Ok(artifact) => artifact,
        Err(CompileError::Rejected { diagnostics, .. }) => {
            progress.emit(Progress::Compiled {
                success: false,
                diagnostics: diagnostics.clone(),
            });
            let note = format!("Compilation failed\n{}", diagnostics);
            return Ok(Status::unjudged(
                &problem.outline(),
                problem.feedback_type(),
                VerdictName::WrongAnswer,
                &note,
            ));
        }
        Err(e) => {
            log::warn!("Cannot compile submission for '{}': {:#}", problem.name(), e);
            progress.emit(Progress::Message(e.to_string()));
            return Ok(Status::unjudged(
                &problem.outline(),
                problem.feedback_type(),
                VerdictName::InternalError,
                &e.to_string(),
            ));
        }
    };
    progress.emit(Progress::Compiled {
        success: true,
        diagnostics: String::from_utf8_lossy(&diagnostics).into_owned(),
    });

    Ok(problem.run(sandbox, language, &artifact, progress).await?)
}
