pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::{Color, Colorize};
use crossterm::terminal;
use error::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::codec::StoredValue;
use crate::config::Config;
use crate::problem::{spawn_judge, Problem, Progress};
use crate::sandbox::{Language, Sandbox};
use crate::status::{IndexedTestcase, Status};
use crate::style;
use crate::verdict::{FeedbackType, VerdictName};

pub fn init_config(dir: impl AsRef<Path>) -> Result<()> {
    let path = dir.as_ref().join(Config::FILENAME);
    ensure!(!path.exists(), "Already exists: {:?}", path);
    fsutil::write_with_mkdir(&path, Config::example_toml())
        .context("Failed to write example config")
}

/// Judges `source_file` and shows progress with a spinner per testcase.
pub async fn judge_submission(
    problem: Arc<dyn Problem>,
    sandbox: Arc<dyn Sandbox>,
    language: Arc<dyn Language>,
    source_file: impl AsRef<Path>,
) -> Result<Status> {
    let source = fsutil::read(&source_file)?;
    let filename = source_file.as_ref().to_string_lossy().into_owned();

    log::info!(
        "Judging {} as {} on '{}'",
        filename,
        language.name(),
        problem.name()
    );

    let mut task = spawn_judge(problem, sandbox, language, source);

    let style = ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .context("Invalid progress template")?;
    let container = MultiProgress::new();
    let mut current: Option<ProgressBar> = None;

    let new_spinner = |msg: String| {
        let bar = container
            .add(ProgressBar::new_spinner())
            .with_style(style.clone())
            .with_message(msg);
        bar.enable_steady_tick(Duration::from_millis(50));
        bar
    };

    while let Some(ev) = task.progress.recv().await {
        match &ev {
            Progress::Compiling { .. } | Progress::TestcaseStarted { .. } => {
                current = Some(new_spinner(format!("{} ...", ev)));
            }
            Progress::Compiled { success, diagnostics } => {
                if let Some(bar) = current.take() {
                    let msg = if *success {
                        ev.to_string().cyan()
                    } else {
                        ev.to_string().bright_red()
                    };
                    bar.finish_with_message(msg.to_string());
                }
                if !diagnostics.is_empty() {
                    container.suspend(|| eprint!("{}", diagnostics));
                }
            }
            Progress::TestcaseFinished {
                index,
                total,
                verdict,
                time_spent,
                ..
            } => {
                if let Some(bar) = current.take() {
                    bar.finish_with_message(
                        format!(
                            "Test {}/{} ... {} [{}ms]",
                            index,
                            total,
                            style::verdict_icon(*verdict),
                            time_spent.as_millis(),
                        )
                        .cyan()
                        .to_string(),
                    );
                }
            }
            Progress::Message(msg) => {
                container.suspend(|| log::warn!("{}", msg));
            }
        }
    }
    if let Some(bar) = current.take() {
        bar.abandon();
    }
    println!();

    task.wait()
        .await
        .with_context(|| format!("Failed to judge {}", filename))
}

pub fn save_status(status: &Status, path: impl AsRef<Path>) -> Result<()> {
    let json = status.encode()?;
    fsutil::write_with_mkdir(&path, json)?;
    log::info!("Saved result to {:?}", path.as_ref());
    Ok(())
}

pub fn load_status(path: impl AsRef<Path>) -> Result<Status> {
    let bytes = fsutil::read(&path)?;
    Status::decode(&StoredValue::Bytes(bytes))
        .with_context(|| format!("Invalid result file {:?}", path.as_ref()))
}

/// Prints `status` the way `feedback` allows: CF shows the verdict and the
/// first failing test, IOI every testset and testcase, ACM just the outcome.
pub fn print_status(status: &Status, feedback: FeedbackType) {
    print!("{}", render_status(status, feedback));

    if feedback == FeedbackType::IOI {
        if let Some(failed) = status.first_non_ac_testcase() {
            print_testcase_detail(&failed);
        }
        print_summary(status);
    }
}

pub fn render_status(status: &Status, feedback: FeedbackType) -> String {
    let mut out = String::new();
    match feedback {
        FeedbackType::ACM => {
            let line = if status.compiled && status.is_ac() {
                "Accepted".green().bold()
            } else {
                "Rejected".bright_red().bold()
            };
            let _ = writeln!(out, "{}", line);
        }
        FeedbackType::CF => {
            if !status.compiled {
                let _ = writeln!(out, "{}", "Compilation error".bright_red().bold());
            } else {
                match status.first_non_ac_testcase() {
                    None => {
                        let _ = writeln!(out, "{}", style::verdict_label(VerdictName::Accepted));
                    }
                    Some(x) => {
                        let _ = writeln!(
                            out,
                            "{} on test {}",
                            style::verdict_label(x.testcase.verdict_name),
                            x.index
                        );
                    }
                }
            }
            let _ = writeln!(
                out,
                "Time: {}ms  Memory: {}KiB",
                status.max_time_spent().as_millis(),
                status.max_memory_usage()
            );
        }
        FeedbackType::IOI => {
            if !status.compiled {
                let _ = writeln!(out, "{}", "Compilation error".bright_red().bold());
            }
            let mut testcases = status.testcases().peekable();
            for ts in &status.feedback {
                let _ = writeln!(
                    out,
                    "{} ({}): {}/{}",
                    ts.name.bold(),
                    ts.scoring,
                    ts.score(),
                    ts.max_score()
                );
                while let Some(x) = testcases.next_if(|x| std::ptr::eq(x.testset, ts)) {
                    let _ = writeln!(
                        out,
                        "  #{:<3} {} {:>5}ms {:>8}KiB",
                        x.index,
                        style::verdict_icon(x.testcase.verdict_name),
                        x.testcase.time_spent.as_millis(),
                        x.testcase.memory_used
                    );
                }
            }
            let _ = writeln!(out, "Score: {}/{}", status.score(), status.max_score());
        }
    }
    out
}

fn print_summary(status: &Status) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let count: HashMap<VerdictName, usize> =
        status.testcases().fold(HashMap::new(), |mut count, x| {
            *count.entry(x.testcase.verdict_name).or_default() += 1;
            count
        });

    let num_total_test = status.testcase_count();
    let num_passed = *count.get(&VerdictName::Accepted).unwrap_or(&0);
    let num_failed = num_total_test - num_passed;

    if num_passed == num_total_test {
        let msg = format!("All {} tests passed ✨", num_total_test);
        print!("{}", msg.green());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} tests failed 💣", num_failed, num_total_test)
        } else {
            format!("All {} tests failed 💀", num_total_test)
        };

        let mut failed: Vec<_> = count
            .into_iter()
            .filter(|(verdict, _)| !verdict.is_accepted())
            .collect();
        failed.sort_by_key(|&(verdict, _)| verdict as u8);

        let detail_msg = failed
            .into_iter()
            .map(|(verdict, cnt)| {
                format!(
                    "{}{}{}",
                    style::verdict_icon(verdict),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}

pub fn print_testcase_detail(x: &IndexedTestcase) {
    let tc = x.testcase;
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = cols as usize;

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();

    let title_color = Color::BrightYellow;
    println!(
        "\n{}: {} [{}ms]\n{}",
        format!("Test {} ({})", x.index, x.testset.name)
            .color(title_color)
            .bold(),
        style::verdict_icon(tc.verdict_name),
        tc.time_spent.as_millis(),
        bold_bar,
    );

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE
                .repeat(cols.saturating_sub(s.len() + 1))
                .bright_black(),
        )
    }

    fn print_lines(entire_str: &str) {
        let lines: Vec<_> = entire_str.lines().collect();
        if lines.is_empty() {
            println!("{}", "<EMPTY>".magenta().dimmed());
            return;
        }
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_end();
            print!("{}", trimmed);

            let num_trailing_whitespace = line.len() - trimmed.len();
            if num_trailing_whitespace > 0 {
                print!(
                    "{}{}",
                    " ".repeat(num_trailing_whitespace).on_red(),
                    "(Trailing whitespace)".bright_red().bold()
                );
            }

            let is_last_line = i + 1 == lines.len();
            if is_last_line && !entire_str.ends_with('\n') {
                print!("{}", " Missing new line ".on_yellow().black().bold());
            }

            println!();
        }
    }

    print_sub_title("[expected]", cols);
    print_lines(&tc.expected_output);

    print_sub_title("[output]", cols);
    print_lines(&tc.output);

    if !tc.checker_output.is_empty() {
        print_sub_title("[checker]", cols);
        println!("{}", tc.checker_output.trim_end());
    }

    println!("{}", bold_bar);
}
