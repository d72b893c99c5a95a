use std::path::PathBuf;

use saiten_core::action;

use super::{ArgFeedback, GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub status_file: PathBuf,

    /// Defaults to the feedback type recorded in the file
    #[arg(short, long)]
    pub feedback: Option<ArgFeedback>,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let status = action::load_status(&args.status_file)?;
    let feedback = args
        .feedback
        .map(Into::into)
        .unwrap_or(status.feedback_type);
    action::print_status(&status, feedback);
    Ok(())
}
