use saiten_core::Config;

use crate::{cmd::GlobalArgs, util};

/// `--config` if given, otherwise the nearest `saiten.toml`.
pub fn load(args: &GlobalArgs) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => Config::from_toml_file(path.clone()),
        None => Config::from_file_finding_in_ancestors(util::current_dir()),
    }
}
