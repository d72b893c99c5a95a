pub mod init;
pub mod judge;
pub mod langs;
pub mod show;

use std::path::PathBuf;

use saiten_core::FeedbackType;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Use this config file instead of looking for `saiten.toml`
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),

    #[command(alias("j"))]
    Judge(judge::Args),

    Langs(langs::Args),
    Show(show::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Judge(args) => judge::exec(args, self).await,
            Langs(args) => langs::exec(args, self),
            Show(args) => show::exec(args, self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgFeedback {
    Cf,
    Ioi,
    Acm,
}

impl From<ArgFeedback> for FeedbackType {
    fn from(value: ArgFeedback) -> Self {
        use ArgFeedback::*;
        match value {
            Cf => FeedbackType::CF,
            Ioi => FeedbackType::IOI,
            Acm => FeedbackType::ACM,
        }
    }
}
