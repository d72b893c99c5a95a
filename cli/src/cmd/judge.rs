use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use saiten_core::{action, DirectoryProblem, Problem};

use super::{ArgFeedback, GlobalArgs, SubcmdResult};
use crate::{config, util};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub problem_dir: PathBuf,

    #[arg()] // positional argument
    pub source: PathBuf,

    /// Language name as listed by `saiten langs`. Picked by file name if omitted.
    #[arg(short, long)]
    pub lang: Option<String>,

    #[arg(short, long)]
    pub feedback: Option<ArgFeedback>,

    /// Write the judged result to this file
    #[arg(short, long)]
    pub save: Option<PathBuf>,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;

    let mut problem = DirectoryProblem::load(&args.problem_dir)
        .with_context(|| format!("Cannot load problem from {:?}", args.problem_dir))?
        .with_languages(&cfg.to_languages())
        .or_feedback_type(cfg.judge.feedback_type());
    if let Some(feedback) = args.feedback {
        problem = problem.with_feedback_type(feedback.into());
    }

    let lang_name = match &args.lang {
        Some(name) => name.clone(),
        None => {
            let filename = util::filename_of(&args.source);
            cfg.find_language_for_filename(&filename)
                .with_context(|| {
                    format!(
                        "Unconfigured language for filename '{}' (No entry matched glob in `language[]`)",
                        filename
                    )
                })?
                .name
                .clone()
        }
    };
    let language = problem.find_language(&lang_name).with_context(|| {
        format!(
            "Language '{}' is not configured or not allowed for '{}'",
            lang_name,
            problem.name()
        )
    })?;

    let sandbox = Arc::new(cfg.judge.sandbox());
    let problem = Arc::new(problem);
    let status = action::judge_submission(problem, sandbox, language, &args.source).await?;

    action::print_status(&status, status.feedback_type);

    if let Some(path) = &args.save {
        action::save_status(&status, path)?;
    }
    Ok(())
}
