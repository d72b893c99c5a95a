//! Runs a compiled submission through a plan of testsets and collects a [`Status`].

use std::{borrow::Cow, path::PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::checker::Checker;
use crate::problem::{CompileError, Progress, ProgressSink, RunError};
use crate::sandbox::{
    Artifact, ExecRequest, ExitOutcome, Interactor, IoFiles, Language, Limits, Sandbox,
    SandboxError,
};
use crate::status::Status;
use crate::testset::{Testcase, Testset, TestsetOutline};
use crate::verdict::{FeedbackType, ScoringType, VerdictName};

const OUTPUT_EXCERPT_LIMIT: usize = 64 * 1024;

/// Input or expected output of a testcase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestData {
    Memory(Vec<u8>),
    File(PathBuf),
}

impl TestData {
    pub async fn load(&self) -> Result<Cow<'_, [u8]>, RunError> {
        match self {
            TestData::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
            TestData::File(path) => tokio::fs::read(path)
                .await
                .map(Cow::Owned)
                .map_err(|source| RunError::TestData {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

impl From<&str> for TestData {
    fn from(s: &str) -> Self {
        TestData::Memory(s.as_bytes().to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct TestcasePlan {
    pub name: String,
    pub input: TestData,
    pub expected: TestData,
    pub max_score: u32,
}

#[derive(Debug, Clone)]
pub struct TestsetPlan {
    pub name: String,
    pub scoring: ScoringType,
    pub testcases: Vec<TestcasePlan>,
}

#[derive(Debug, Clone, Default)]
pub struct TestPlan {
    pub testsets: Vec<TestsetPlan>,
}

impl TestPlan {
    pub fn outline(&self) -> Vec<TestsetOutline> {
        self.testsets
            .iter()
            .map(|ts| TestsetOutline {
                name: ts.name.clone(),
                scoring: ts.scoring,
                max_scores: ts.testcases.iter().map(|tc| tc.max_score).collect(),
            })
            .collect()
    }

    pub fn testcase_count(&self) -> usize {
        self.testsets.iter().map(|ts| ts.testcases.len()).sum()
    }
}

/// Reads the whole source, then asks the sandbox to compile it.
pub async fn compile(
    sandbox: &dyn Sandbox,
    language: &dyn Language,
    source: &mut (dyn AsyncRead + Send + Unpin),
    diagnostics: &mut (dyn AsyncWrite + Send + Unpin),
) -> Result<Artifact, CompileError> {
    let mut code = Vec::new();
    source
        .read_to_end(&mut code)
        .await
        .map_err(CompileError::ReadSource)?;

    let compilation = sandbox.compile(language, &code, diagnostics).await?;
    match compilation.artifact {
        Some(artifact) => {
            log::info!("Compiled ({})", language.name());
            Ok(artifact)
        }
        None => Err(CompileError::Rejected {
            outcome: compilation.outcome,
            diagnostics: String::from_utf8_lossy(&compilation.diagnostics).into_owned(),
        }),
    }
}

/// Everything needed to judge one artifact.
pub struct Judge<'a> {
    pub sandbox: &'a dyn Sandbox,
    pub language: &'a dyn Language,
    pub artifact: &'a Artifact,
    pub limits: Limits,
    pub io_files: Option<&'a IoFiles>,
    pub checker: &'a dyn Checker,
    /// `Some` for interactive problems; the checker is unused then.
    pub interactor: Option<&'a Interactor>,
    pub feedback_type: FeedbackType,
    pub progress: &'a ProgressSink,
}

impl Judge<'_> {
    /// Runs every testcase of `plan` in order.
    ///
    /// A sandbox failure on a single testcase is recorded as an internal error
    /// and judging goes on; an unavailable sandbox aborts the run.
    pub async fn run(&self, plan: &TestPlan) -> Result<Status, RunError> {
        self.artifact
            .open()
            .await
            .map_err(|source| RunError::ArtifactUnreadable {
                path: self.artifact.path().to_owned(),
                source,
            })?;

        let total = plan.testcase_count();
        let mut index = 0;
        let mut feedback = Vec::with_capacity(plan.testsets.len());

        for ts in &plan.testsets {
            let mut testset = Testset::new(&ts.name, ts.scoring);

            for tc in &ts.testcases {
                index += 1;
                self.progress.emit(Progress::TestcaseStarted {
                    index,
                    total,
                    testset: ts.name.clone(),
                    name: tc.name.clone(),
                });

                let input = tc.input.load().await?;
                let expected = tc.expected.load().await?;

                let mut result = match self.judge_testcase(&input, &expected).await {
                    Ok(result) => result,
                    Err(e @ SandboxError::Unavailable(_)) => return Err(e.into()),
                    Err(e) => {
                        log::warn!("Sandbox failed on test {} ({}): {:#}", index, tc.name, e);
                        Testcase {
                            verdict_name: VerdictName::InternalError,
                            checker_output: e.to_string(),
                            expected_output: excerpt(&expected),
                            ..Default::default()
                        }
                    }
                };
                result.testset = ts.name.clone();
                result.max_score = tc.max_score;
                result.score = if result.verdict_name.is_accepted() {
                    tc.max_score
                } else {
                    0
                };

                log::debug!(
                    "Test {}/{} ({}): {}",
                    index,
                    total,
                    tc.name,
                    result.verdict_name.code()
                );
                self.progress.emit(Progress::TestcaseFinished {
                    index,
                    total,
                    testset: ts.name.clone(),
                    verdict: result.verdict_name,
                    time_spent: result.time_spent,
                });
                testset.testcases.push(result);
            }
            feedback.push(testset);
        }

        Ok(Status::new(true, self.feedback_type, feedback))
    }

    async fn judge_testcase(&self, input: &[u8], expected: &[u8]) -> Result<Testcase, SandboxError> {
        let request = ExecRequest {
            input,
            limits: self.limits,
            io_files: self.io_files,
        };

        if let Some(interactor) = self.interactor {
            let res = self
                .sandbox
                .execute_interactive(self.language, self.artifact, interactor, request)
                .await?;
            use ExitOutcome::*;
            let (verdict, crash) = match (res.program.outcome, res.interactor) {
                (TimedOut, _) | (_, TimedOut) => (VerdictName::TimeLimitExceeded, None),
                (MemoryExceeded, _) => (VerdictName::MemoryLimitExceeded, None),
                (Signaled, _) => (VerdictName::RuntimeError, Some("Killed by signal".to_owned())),
                (Exited(code), _) if code != 0 => {
                    (VerdictName::RuntimeError, Some(format!("Exit code {}", code)))
                }
                (_, Exited(0)) => (VerdictName::Accepted, None),
                _ => (VerdictName::WrongAnswer, None),
            };
            let checker_output = match crash {
                Some(crash) if res.interactor_message.is_empty() => crash,
                Some(crash) => format!("{}\n{}", crash, res.interactor_message),
                None => res.interactor_message,
            };
            return Ok(Testcase {
                verdict_name: verdict,
                checker_output,
                time_spent: res.program.time_spent,
                memory_used: res.program.memory_used,
                ..Default::default()
            });
        }

        let exec = self
            .sandbox
            .execute(self.language, self.artifact, request)
            .await?;
        let (verdict, checker_output) = match exec.outcome {
            ExitOutcome::TimedOut => (VerdictName::TimeLimitExceeded, String::new()),
            ExitOutcome::MemoryExceeded => (VerdictName::MemoryLimitExceeded, String::new()),
            ExitOutcome::Signaled => (VerdictName::RuntimeError, "Killed by signal".to_owned()),
            ExitOutcome::Exited(0) => {
                let r = self.checker.check(input, &exec.stdout, expected);
                (r.verdict, r.message)
            }
            ExitOutcome::Exited(code) => (
                VerdictName::RuntimeError,
                format!("Exit code {}\n{}", code, excerpt(&exec.stderr)),
            ),
        };

        Ok(Testcase {
            verdict_name: verdict,
            output: excerpt(&exec.stdout),
            expected_output: excerpt(expected),
            checker_output,
            time_spent: exec.time_spent,
            memory_used: exec.memory_used,
            ..Default::default()
        })
    }
}

fn excerpt(bytes: &[u8]) -> String {
    if bytes.len() <= OUTPUT_EXCERPT_LIMIT {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut s = String::from_utf8_lossy(&bytes[..OUTPUT_EXCERPT_LIMIT]).into_owned();
    s.push_str("\n...");
    s
}
