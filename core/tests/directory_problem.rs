use std::{path::Path, sync::Arc};

use saiten_core::language::CommandLanguage;
use saiten_core::sandbox::{Language, ProcessSandbox};
use saiten_core::{
    spawn_judge, DirectoryProblem, FeedbackType, Problem, Progress, Status, StoredValue,
    VerdictName::*,
};

fn write(dir: &Path, rel: &str, contents: &str) {
    fsutil::write_with_mkdir(dir.join(rel), contents).unwrap();
}

fn sh() -> Arc<dyn Language> {
    Arc::new(CommandLanguage::interpreted("sh", "main.sh", "sh #{filePath}"))
}

fn aplusb_dir() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    write(
        dir,
        "problem.toml",
        r#"
name = "A + B"
time_limit_ms = 2000
feedback = "ioi"

[[testset]]
name = "samples"
scoring = "sum"
points = 10
dir = "tests/samples"

[[testset]]
name = "large"
scoring = "group"
points = 40
dir = "tests/large"
"#,
    );
    write(dir, "tests/samples/1.in", "1 2\n");
    write(dir, "tests/samples/1.out", "3\n");
    write(dir, "tests/samples/2.in", "0 0\n");
    write(dir, "tests/samples/2.out", "0\n");
    write(dir, "tests/large/1.in", "1000 2000\n");
    write(dir, "tests/large/1.out", "3000\n");
    write(dir, "tests/large/2.in", "-5 5\n");
    write(dir, "tests/large/2.out", "0\n");
    tmp
}

async fn judge(problem: DirectoryProblem, source: &str) -> (Status, Vec<Progress>) {
    let language = sh();
    let problem = problem.with_languages(&[language.clone()]);
    let mut task = spawn_judge(
        Arc::new(problem),
        Arc::new(ProcessSandbox::new()),
        language,
        source.as_bytes().to_vec(),
    );
    let mut events = Vec::new();
    while let Some(ev) = task.progress.recv().await {
        events.push(ev);
    }
    (task.wait().await.unwrap(), events)
}

fn verdicts(status: &Status) -> Vec<saiten_core::VerdictName> {
    status.testcases().map(|x| x.testcase.verdict_name).collect()
}

#[tokio::test]
async fn correct_program_gets_full_score() {
    let tmp = aplusb_dir();
    let problem = DirectoryProblem::load(tmp.path()).unwrap();
    let (status, events) = judge(problem, "read a b; echo $((a + b))").await;

    assert!(status.compiled);
    assert!(status.is_ac());
    assert_eq!(status.feedback_type, FeedbackType::IOI);
    assert_eq!(status.score(), 100);
    assert_eq!(status.max_score(), 100);
    assert_eq!(status.first_non_ac(), None);
    assert_eq!(status.index_testcase(3).unwrap().testset, "large");
    assert_eq!(status.index_testcase(5), None);

    // Compiling, Compiled, then a start/finish pair per testcase.
    assert_eq!(events.len(), 2 + 2 * 4);
}

#[tokio::test]
async fn failures_are_scored_per_testset() {
    let tmp = aplusb_dir();
    let problem = DirectoryProblem::load(tmp.path()).unwrap();
    let source = r#"read a b; if [ "$a" = 1000 ]; then exit 3; fi; echo $((a + b))"#;
    let (status, _) = judge(problem, source).await;

    assert_eq!(verdicts(&status), [Accepted, Accepted, RuntimeError, Accepted]);
    assert_eq!(status.score(), 20);
    assert_eq!(status.first_non_ac(), Some(3));
    assert_eq!(status.verdict(), RuntimeError);

    // Stored and read back unchanged.
    let stored = status.to_stored_value().unwrap();
    assert_eq!(Status::decode(&stored).unwrap(), status);
    let bytes = StoredValue::Bytes(status.encode().unwrap().into_bytes());
    assert_eq!(Status::decode(&bytes).unwrap(), status);
}

#[tokio::test]
async fn slow_and_wrong_programs() {
    let tmp = aplusb_dir();
    write(
        tmp.path(),
        "problem.toml",
        r#"
name = "A + B"
time_limit_ms = 300

[[testset]]
name = "samples"
points = 1
dir = "tests/samples"
"#,
    );
    let problem = DirectoryProblem::load(tmp.path()).unwrap();
    let source = r#"read a b; if [ "$a" = 0 ]; then sleep 5; fi; echo $((a - b))"#;
    let (status, _) = judge(problem, source).await;

    assert_eq!(status.feedback_type, FeedbackType::CF);
    assert_eq!(verdicts(&status), [WrongAnswer, TimeLimitExceeded]);
    let wa = status.index_testcase(1).unwrap();
    assert_eq!(wa.output, "-1\n");
    assert_eq!(wa.expected_output, "3\n");
    assert_eq!(wa.checker_output, "Token 1: expected '3', found '-1'");
}

#[tokio::test]
async fn compile_error_marks_every_testcase() {
    let tmp = aplusb_dir();
    let language: Arc<dyn Language> = Arc::new(CommandLanguage::compiled(
        "broken",
        "main.txt",
        "prog",
        "echo 'main.txt:1: syntax error' >&2; exit 1",
        "sh #{artifactPath}",
    ));
    let problem = DirectoryProblem::load(tmp.path())
        .unwrap()
        .with_languages(&[language.clone()]);
    assert_eq!(problem.languages().len(), 1);

    let task = spawn_judge(
        Arc::new(problem),
        Arc::new(ProcessSandbox::new()),
        language,
        b"whatever".to_vec(),
    );
    let status = task.wait().await.unwrap();

    assert!(!status.compiled);
    assert_eq!(verdicts(&status), [WrongAnswer; 4]);
    assert_eq!(status.score(), 0);
    assert_eq!(status.max_score(), 100);
    assert_eq!(
        status.index_testcase(1).unwrap().checker_output,
        "Compilation failed\nmain.txt:1: syntax error\n"
    );
}

#[tokio::test]
async fn file_io_problem() {
    let tmp = aplusb_dir();
    write(
        tmp.path(),
        "problem.toml",
        r#"
name = "A + B (files)"
input_file = "input.txt"
output_file = "output.txt"

[[testset]]
name = "samples"
points = 50
dir = "tests/samples"
"#,
    );
    let problem = DirectoryProblem::load(tmp.path()).unwrap();
    assert!(problem.input_output_files().is_some());

    let (status, _) = judge(problem, "read a b < input.txt; echo $((a + b)) > output.txt").await;
    assert_eq!(verdicts(&status), [Accepted, Accepted]);
    assert_eq!(status.score(), 100);
}

fn doubling_dir() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    write(
        dir,
        "problem.toml",
        r#"
name = "Double it"
interactor = "sh #{interactorDir}/interactor.sh #{inputPath}"

[[testset]]
name = "all"
points = 50
dir = "tests"
"#,
    );
    write(
        dir,
        "interactor.sh",
        r#"n=$(cat "$1"); echo "$n"; read ans
if [ "$ans" = "$((n * 2))" ]; then echo ok >&2; else echo "expected $((n * 2)), got $ans" >&2; exit 1; fi
"#,
    );
    write(dir, "tests/1.in", "21\n");
    write(dir, "tests/1.out", "");
    write(dir, "tests/2.in", "-4\n");
    write(dir, "tests/2.out", "");
    tmp
}

#[tokio::test]
async fn interactive_problem() {
    let tmp = doubling_dir();
    let problem = DirectoryProblem::load(tmp.path()).unwrap();
    assert!(problem.interactive());

    let source = r#"read n; if [ "$n" -lt 0 ]; then echo 0; else echo $((n * 2)); fi"#;
    let (status, _) = judge(problem, source).await;

    assert_eq!(verdicts(&status), [Accepted, WrongAnswer]);
    assert_eq!(status.index_testcase(1).unwrap().checker_output, "ok\n");
    assert_eq!(
        status.index_testcase(2).unwrap().checker_output,
        "expected -8, got 0\n"
    );
    assert_eq!(status.score(), 50);
}

#[tokio::test]
async fn interactive_program_crashing_after_answer_is_runtime_error() {
    let tmp = doubling_dir();
    let problem = DirectoryProblem::load(tmp.path()).unwrap();

    let (status, _) = judge(problem, "read n; echo $((n * 2)); exit 7").await;

    assert_eq!(verdicts(&status), [RuntimeError, RuntimeError]);
    assert_eq!(
        status.index_testcase(1).unwrap().checker_output,
        "Exit code 7\nok\n"
    );
    assert_eq!(status.score(), 0);
}

#[tokio::test]
async fn interactive_program_that_stalls_exceeds_time_limit() {
    let tmp = doubling_dir();
    let problem = DirectoryProblem::load(tmp.path()).unwrap();

    let (status, _) = judge(problem, "read n; sleep 5").await;

    assert_eq!(verdicts(&status), [TimeLimitExceeded, TimeLimitExceeded]);
    assert_eq!(status.score(), 0);
}
