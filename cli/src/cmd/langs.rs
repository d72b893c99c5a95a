use colored::Colorize;

use super::{GlobalArgs, SubcmdResult};
use crate::{config, util};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Also show compile/run commands
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;

    if let Some(path) = &cfg.source_config_file {
        log::info!("Config: {:?}", util::replace_homedir_to_tilde(path));
    }

    for lang in &cfg.languages {
        println!("{} ({})", lang.name.bold(), lang.pattern.as_str());
        if args.verbose {
            if let Some(compile) = &lang.compile {
                println!("  compile: {}", compile);
            }
            println!("  run:     {}", lang.run);
        }
    }
    Ok(())
}
