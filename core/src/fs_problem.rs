//! A problem stored as a directory with a `problem.toml` manifest.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::checker::CheckerKind;
use crate::content::{Attachment, Content};
use crate::judge::{self, Judge, TestData, TestPlan, TestcasePlan, TestsetPlan};
use crate::problem::{CompileError, Problem, ProgressSink, RunError};
use crate::sandbox::{Artifact, Interactor, IoFiles, Language, Sandbox};
use crate::status::Status;
use crate::testset::TestsetOutline;
use crate::verdict::{FeedbackType, ScoringType};

#[derive(Debug, thiserror::Error)]
pub enum ProblemLoadError {
    #[error(transparent)]
    Fs(#[from] fsutil::Error),

    #[error("Invalid manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid testcase pattern in testset '{testset}': {source}")]
    Pattern {
        testset: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Missing expected output '{}'", .0.display())]
    MissingOutput(PathBuf),

    #[error("`input_file` and `output_file` must be given together")]
    IoFilesPair,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "Manifest::default_time_limit_ms")]
    time_limit_ms: u64,
    #[serde(default = "Manifest::default_memory_limit_kib")]
    memory_limit_kib: u64,
    #[serde(default)]
    checker: CheckerKind,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    languages: Vec<String>,
    input_file: Option<String>,
    output_file: Option<String>,
    interactor: Option<String>,
    #[serde(default, rename = "title")]
    titles: Vec<TitleEntry>,
    #[serde(default, rename = "statement")]
    statements: Vec<StatementEntry>,
    #[serde(default, rename = "attachment")]
    attachments: Vec<AttachmentEntry>,
    #[serde(default, rename = "testset")]
    testsets: Vec<TestsetEntry>,
}

impl Manifest {
    fn default_time_limit_ms() -> u64 {
        1000
    }

    fn default_memory_limit_kib() -> u64 {
        256 * 1024
    }
}

#[derive(Debug, Deserialize)]
struct TitleEntry {
    locale: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct StatementEntry {
    locale: String,
    path: PathBuf,
    #[serde(rename = "type")]
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentEntry {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TestsetEntry {
    name: String,
    #[serde(default)]
    scoring: String,
    /// Score of each testcase.
    #[serde(default)]
    points: u32,
    dir: PathBuf,
    #[serde(default = "TestsetEntry::default_pattern")]
    pattern: String,
}

impl TestsetEntry {
    fn default_pattern() -> String {
        "*.in".to_owned()
    }
}

/// Guesses the content type of a statement file from its extension.
fn content_type_of(path: &Path) -> &'static str {
    match path.extension().and_then(|x| x.to_str()) {
        Some("html" | "htm") => Content::HTML,
        Some("pdf") => Content::PDF,
        _ => Content::TEXT,
    }
}

/// Problem directory layout:
///
/// ```text
/// problem.toml
/// statement.html
/// tests/samples/01.in
/// tests/samples/01.out
/// ...
/// ```
#[derive(Debug)]
pub struct DirectoryProblem {
    dir: PathBuf,
    name: String,
    tags: Vec<String>,
    time_limit: Duration,
    memory_limit: u64,
    checker: CheckerKind,
    /// `None` when the manifest leaves it to the caller.
    feedback_type: Option<FeedbackType>,
    language_names: Vec<String>,
    languages: Vec<Arc<dyn Language>>,
    io_files: Option<IoFiles>,
    interactor: Option<Interactor>,
    titles: Vec<Content>,
    statements: Vec<Content>,
    attachments: Vec<Attachment>,
    plan: TestPlan,
}

impl DirectoryProblem {
    pub const MANIFEST_FILENAME: &str = "problem.toml";

    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ProblemLoadError> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(Self::MANIFEST_FILENAME);
        let manifest: Manifest = toml::from_str(&fsutil::read_to_string(&manifest_path)?)
            .map_err(|source| ProblemLoadError::Manifest {
                path: manifest_path,
                source,
            })?;

        let io_files = match (manifest.input_file, manifest.output_file) {
            (Some(input), Some(output)) => Some(IoFiles { input, output }),
            (None, None) => None,
            _ => return Err(ProblemLoadError::IoFilesPair),
        };

        let titles = manifest
            .titles
            .into_iter()
            .map(|t| Content::text(t.locale, t.text))
            .collect();

        let statements = manifest
            .statements
            .into_iter()
            .map(|s| {
                let path = dir.join(&s.path);
                let content_type = s
                    .content_type
                    .unwrap_or_else(|| content_type_of(&path).to_owned());
                Ok(Content::new(s.locale, fsutil::read(&path)?, content_type))
            })
            .collect::<Result<_, ProblemLoadError>>()?;

        let attachments = manifest
            .attachments
            .into_iter()
            .map(|a| {
                let path = dir.join(&a.path);
                Ok(Attachment {
                    name: path
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .into_owned(),
                    contents: fsutil::read(&path)?,
                })
            })
            .collect::<Result<_, ProblemLoadError>>()?;

        let testsets = manifest
            .testsets
            .into_iter()
            .map(|ts| Self::load_testset(dir, ts))
            .collect::<Result<_, _>>()?;

        let problem = Self {
            dir: dir.to_owned(),
            name: manifest.name,
            tags: manifest.tags,
            time_limit: Duration::from_millis(manifest.time_limit_ms),
            memory_limit: manifest.memory_limit_kib,
            checker: manifest.checker,
            feedback_type: manifest.feedback.as_deref().map(FeedbackType::from),
            language_names: manifest.languages,
            languages: Vec::new(),
            io_files,
            interactor: manifest.interactor.map(|command| Interactor {
                command,
                dir: dir.to_owned(),
            }),
            titles,
            statements,
            attachments,
            plan: TestPlan { testsets },
        };
        log::debug!(
            "Loaded problem '{}' ({} testcases) from {:?}",
            problem.name,
            problem.plan.testcase_count(),
            problem.dir
        );
        Ok(problem)
    }

    fn load_testset(dir: &Path, entry: TestsetEntry) -> Result<TestsetPlan, ProblemLoadError> {
        let pattern =
            glob::Pattern::new(&entry.pattern).map_err(|source| ProblemLoadError::Pattern {
                testset: entry.name.clone(),
                source,
            })?;

        let testcases = fsutil::find_files_matching(dir.join(&entry.dir), &pattern)?
            .into_iter()
            .map(|input| {
                let expected = input.with_extension("out");
                if !expected.is_file() {
                    return Err(ProblemLoadError::MissingOutput(expected));
                }
                Ok(TestcasePlan {
                    name: input
                        .file_stem()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .into_owned(),
                    input: TestData::File(input),
                    expected: TestData::File(expected),
                    max_score: entry.points,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(TestsetPlan {
            scoring: ScoringType::from(entry.scoring.as_str()),
            name: entry.name,
            testcases,
        })
    }

    /// Offers the languages of `available` the manifest allows; all of them when it names none.
    pub fn with_languages(mut self, available: &[Arc<dyn Language>]) -> Self {
        self.languages = available
            .iter()
            .filter(|lang| {
                self.language_names.is_empty()
                    || self.language_names.iter().any(|n| n == lang.name())
            })
            .cloned()
            .collect();
        self
    }

    pub fn with_feedback_type(mut self, feedback_type: FeedbackType) -> Self {
        self.feedback_type = Some(feedback_type);
        self
    }

    /// Uses `feedback_type` unless the manifest names one.
    pub fn or_feedback_type(mut self, feedback_type: FeedbackType) -> Self {
        self.feedback_type.get_or_insert(feedback_type);
        self
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn find_language(&self, name: &str) -> Option<Arc<dyn Language>> {
        self.languages.iter().find(|l| l.name() == name).cloned()
    }
}

#[async_trait]
impl Problem for DirectoryProblem {
    fn name(&self) -> &str {
        &self.name
    }

    fn titles(&self) -> &[Content] {
        &self.titles
    }

    fn statements(&self) -> &[Content] {
        &self.statements
    }

    fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    fn time_limit(&self) -> Duration {
        self.time_limit
    }

    fn input_output_files(&self) -> Option<&IoFiles> {
        self.io_files.as_ref()
    }

    fn interactive(&self) -> bool {
        self.interactor.is_some()
    }

    fn languages(&self) -> Vec<Arc<dyn Language>> {
        self.languages.clone()
    }

    fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn feedback_type(&self) -> FeedbackType {
        self.feedback_type.unwrap_or_default()
    }

    fn outline(&self) -> Vec<TestsetOutline> {
        self.plan.outline()
    }

    async fn compile(
        &self,
        sandbox: &dyn Sandbox,
        language: &dyn Language,
        source: &mut (dyn AsyncRead + Send + Unpin),
        diagnostics: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<Artifact, CompileError> {
        judge::compile(sandbox, language, source, diagnostics).await
    }

    async fn run(
        &self,
        sandbox: &dyn Sandbox,
        language: &dyn Language,
        artifact: &Artifact,
        progress: &ProgressSink,
    ) -> Result<Status, RunError> {
        log::info!(
            "Judging '{}' with {} testcases",
            self.name,
            self.plan.testcase_count()
        );
        Judge {
            sandbox,
            language,
            artifact,
            limits: self.limits(),
            io_files: self.io_files.as_ref(),
            checker: self.checker.checker(),
            interactor: self.interactor.as_ref(),
            feedback_type: self.feedback_type(),
            progress,
        }
        .run(&self.plan)
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::language::CommandLanguage;

    fn write(dir: &Path, rel: &str, contents: &str) {
        fsutil::write_with_mkdir(dir.join(rel), contents).unwrap();
    }

    fn problem_dir(manifest: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        write(dir, "problem.toml", manifest);
        write(dir, "statement.html", "<p>Print a + b.</p>");
        write(dir, "tests/samples/01.in", "1 2\n");
        write(dir, "tests/samples/01.out", "3\n");
        write(dir, "tests/samples/02.in", "5 5\n");
        write(dir, "tests/samples/02.out", "10\n");
        write(dir, "tests/samples/README", "ignored");
        tmp
    }

    const MANIFEST: &str = r#"
name = "A + B"
tags = ["math", "easy"]
time_limit_ms = 2000
checker = "exact"
languages = ["sh"]

[[title]]
locale = "en"
text = "Addition"

[[statement]]
locale = "en"
path = "statement.html"

[[testset]]
name = "samples"
scoring = "sum"
points = 5
dir = "tests/samples"
"#;

    #[test]
    fn loads_manifest_and_testcases() {
        let tmp = problem_dir(MANIFEST);
        let p = DirectoryProblem::load(tmp.path()).unwrap();

        assert_eq!(p.name(), "A + B");
        assert_eq!(p.tags(), ["math", "easy"]);
        assert_eq!(p.time_limit(), Duration::from_millis(2000));
        assert_eq!(p.memory_limit(), 262144);
        assert_eq!(p.feedback_type(), FeedbackType::CF);
        assert!(!p.interactive());
        assert!(p.input_output_files().is_none());

        assert_eq!(p.titles()[0].to_string(), "Addition");
        assert_eq!(p.html_statements().len(), 1);
        assert!(p.pdf_statements().is_empty());

        assert_eq!(
            p.outline(),
            [TestsetOutline {
                name: "samples".into(),
                scoring: ScoringType::Sum,
                max_scores: vec![5, 5],
            }]
        );
        let names: Vec<_> = p.plan().testsets[0]
            .testcases
            .iter()
            .map(|tc| tc.name.as_str())
            .collect();
        assert_eq!(names, ["01", "02"]);
    }

    #[test]
    fn feedback_type_precedence() {
        let tmp = problem_dir(MANIFEST);
        let p = DirectoryProblem::load(tmp.path())
            .unwrap()
            .or_feedback_type(FeedbackType::ACM);
        assert_eq!(p.feedback_type(), FeedbackType::ACM);

        let tmp = problem_dir(&format!("feedback = \"ioi\"\n{}", MANIFEST));
        let p = DirectoryProblem::load(tmp.path())
            .unwrap()
            .or_feedback_type(FeedbackType::ACM);
        assert_eq!(p.feedback_type(), FeedbackType::IOI);
        assert_eq!(
            p.with_feedback_type(FeedbackType::CF).feedback_type(),
            FeedbackType::CF
        );
    }

    #[test]
    fn filters_languages_by_manifest() {
        let tmp = problem_dir(MANIFEST);
        let available: Vec<Arc<dyn Language>> = vec![
            Arc::new(CommandLanguage::interpreted("sh", "main.sh", "sh #{filePath}")),
            Arc::new(CommandLanguage::interpreted("py", "main.py", "python3 #{filePath}")),
        ];
        let p = DirectoryProblem::load(tmp.path())
            .unwrap()
            .with_languages(&available);

        assert_eq!(p.languages().len(), 1);
        assert!(p.find_language("sh").is_some());
        assert!(p.find_language("py").is_none());
    }

    #[test]
    fn missing_expected_output_is_rejected() {
        let tmp = problem_dir(MANIFEST);
        write(tmp.path(), "tests/samples/03.in", "0 0\n");

        let err = DirectoryProblem::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProblemLoadError::MissingOutput(p) if p.ends_with("03.out")));
    }

    #[test]
    fn io_files_must_come_in_pairs() {
        let tmp = problem_dir(&format!("input_file = \"in.txt\"\n{}", MANIFEST));
        let err = DirectoryProblem::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProblemLoadError::IoFilesPair));
    }

    #[test]
    fn invalid_manifest_is_reported() {
        let tmp = problem_dir("name = 1");
        let err = DirectoryProblem::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProblemLoadError::Manifest { .. }));
    }

    #[test]
    fn statement_type_follows_extension() {
        assert_eq!(content_type_of(Path::new("a.html")), Content::HTML);
        assert_eq!(content_type_of(Path::new("a.pdf")), Content::PDF);
        assert_eq!(content_type_of(Path::new("a.md")), Content::TEXT);
    }
}
